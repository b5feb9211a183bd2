// Run-time controls for block-average pressure calculation (WPAVE item set)

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::PAvgError;

/// Depth correction applied to block pressures before averaging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DepthCorrectionRepr", into = "String")]
pub enum DepthCorrection {
    /// Correct using the well's own mixture density in each connection
    Well,
    /// Correct using the pore-volume weighted reservoir density around
    /// each connection
    Res,
    /// No correction
    None,
    /// Unrecognised flag, rejected when pressures are inferred
    Unsupported(String),
}

impl DepthCorrection {
    /// Deck integer code of this mode.
    pub fn code(&self) -> Option<i64> {
        match self {
            DepthCorrection::Well => Some(1),
            DepthCorrection::Res => Some(2),
            DepthCorrection::None => Some(3),
            DepthCorrection::Unsupported(_) => None,
        }
    }
}

impl From<i64> for DepthCorrection {
    fn from(code: i64) -> Self {
        match code {
            1 => DepthCorrection::Well,
            2 => DepthCorrection::Res,
            3 => DepthCorrection::None,
            other => DepthCorrection::Unsupported(other.to_string()),
        }
    }
}

impl From<&str> for DepthCorrection {
    fn from(input: &str) -> Self {
        match input.trim().to_ascii_uppercase().as_str() {
            "WELL" => DepthCorrection::Well,
            "RES" => DepthCorrection::Res,
            "NONE" => DepthCorrection::None,
            _ => DepthCorrection::Unsupported(input.to_string()),
        }
    }
}

impl fmt::Display for DepthCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthCorrection::Well => write!(f, "WELL"),
            DepthCorrection::Res => write!(f, "RES"),
            DepthCorrection::None => write!(f, "NONE"),
            DepthCorrection::Unsupported(id) => write!(f, "{}", id),
        }
    }
}

impl From<DepthCorrection> for String {
    fn from(mode: DepthCorrection) -> Self {
        mode.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DepthCorrectionRepr {
    Code(i64),
    Name(String),
}

impl From<DepthCorrectionRepr> for DepthCorrection {
    fn from(repr: DepthCorrectionRepr) -> Self {
        match repr {
            DepthCorrectionRepr::Code(code) => code.into(),
            DepthCorrectionRepr::Name(name) => name.as_str().into(),
        }
    }
}

/// Block-average pressure controls
///
/// # Fields
/// * inner_weight: F1, weight of the connecting cell relative to its
///   neighbours.  Negative values select pore-volume weighting without an
///   explicit centre/neighbour split.
/// * conn_weight: F2, blend between CTF-weighted and pore-volume weighted
///   connection averages.
/// * depth_correction: how to gravity correct block pressures
/// * open_connections: whether to include open connections only
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PAvgControls {
    pub inner_weight: f64,
    pub conn_weight: f64,
    pub depth_correction: DepthCorrection,
    pub open_connections: bool,
}

impl Default for PAvgControls {
    fn default() -> Self {
        Self {
            inner_weight: 0.5,
            conn_weight: 1.0,
            depth_correction: DepthCorrection::Well,
            open_connections: true,
        }
    }
}

impl PAvgControls {
    pub fn new(
        inner_weight: f64,
        conn_weight: f64,
        depth_correction: DepthCorrection,
        open_connections: bool,
    ) -> Self {
        Self {
            inner_weight,
            conn_weight,
            depth_correction,
            open_connections,
        }
    }

    /// Parse controls from TOML.  Accepts either a `[wpave]` table or the
    /// keys at top level.  Missing keys take the WPAVE defaults, unknown
    /// keys are an error.
    pub fn from_toml_str(input: &str) -> Result<Self, PAvgError> {
        let table: toml::Table = toml::from_str(input)?;
        let controls = match table.get("wpave") {
            Some(wpave) => wpave.clone().try_into()?,
            None => toml::Value::Table(table).try_into()?,
        };
        Ok(controls)
    }

    /// Load controls from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading WPAVE controls from {}", path.display()))?;
        let controls = Self::from_toml_str(&contents)
            .with_context(|| format!("parsing WPAVE controls in {}", path.display()))?;
        log::debug!("Loaded WPAVE controls from {}: {:?}", path.display(), controls);
        Ok(controls)
    }
}

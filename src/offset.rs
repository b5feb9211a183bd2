// Depth (gravity) correction of block pressures

use ndarray::{Array1, ArrayView1};

use crate::controls::{DepthCorrection, PAvgControls};
use crate::error::PAvgError;
use crate::source::{SourceItem, Sources};
use crate::summation::WeightedRunningAverage;
use crate::topology::{ConnectionSelection, WbpTopology};

/// Pressure correction translating a pressure value from `depth` to
/// `ref_depth`
///
/// $$\Delta p = \rho \left(d_{\mathrm{ref}} - d\right) g$$
///
/// # Arguments
/// * density: mixture density in kg/m^3
/// * depth: connection depth in m
/// * gravity: strength of gravity acceleration in m/s^2
/// * ref_depth: reference depth in m
pub fn pressure_offset(density: f64, depth: f64, gravity: f64, ref_depth: f64) -> f64 {
    density * (ref_depth - depth) * gravity
}

/// [`pressure_offset`] for each pair of `density` and `depth`.  Both arrays
/// must have the same length.
pub fn pressure_offsets(
    density: ArrayView1<'_, f64>,
    depth: ArrayView1<'_, f64>,
    gravity: f64,
    ref_depth: f64,
) -> Result<Array1<f64>, PAvgError> {
    if depth.len() != density.len() {
        return Err(PAvgError::SourceColumnSize {
            column: "depth",
            expected: density.len(),
            actual: depth.len(),
        });
    }
    Ok(density
        .iter()
        .zip(depth.iter())
        .map(|(&rho, &d)| pressure_offset(rho, d, gravity, ref_depth))
        .collect())
}

/// Per-connection pressure offsets, one for each connection processed by
/// the current pass (all connections, or open connections only).
///
/// Returns all zeros when depth correction is `NONE` or when `gravity` is
/// not a normal, non-zero number.
pub fn connection_pressure_offset(
    topology: &WbpTopology,
    sources: &Sources,
    controls: &PAvgControls,
    gravity: f64,
    ref_depth: f64,
) -> Result<Array1<f64>, PAvgError> {
    let selection = topology.selection(controls.open_connections);

    if controls.depth_correction == DepthCorrection::None || !gravity.is_normal() {
        return Ok(Array1::zeros(selection.len()));
    }

    match &controls.depth_correction {
        DepthCorrection::Res => offset_res(topology, selection, sources, gravity, ref_depth),
        DepthCorrection::Well => offset_well(topology, selection, sources, gravity, ref_depth),
        other => Err(PAvgError::UnsupportedDepthCorrection(other.to_string())),
    }
}

fn offset_well(
    topology: &WbpTopology,
    selection: ConnectionSelection<'_>,
    sources: &Sources,
    gravity: f64,
    ref_depth: f64,
) -> Result<Array1<f64>, PAvgError> {
    let mut dp = Array1::zeros(selection.len());

    for (slot, conn_ix) in selection.iter().enumerate() {
        let conn = &topology.connections[conn_ix];
        let density = sources.well_conns.get(conn_ix)?[SourceItem::MixtureDensity];

        dp[slot] = pressure_offset(density, conn.depth, gravity, ref_depth);
        log::trace!("Connection {}: well density {}, dp = {}", conn_ix, density, dp[slot]);
    }

    Ok(dp)
}

fn offset_res(
    topology: &WbpTopology,
    selection: ConnectionSelection<'_>,
    sources: &Sources,
    gravity: f64,
    ref_depth: f64,
) -> Result<Array1<f64>, PAvgError> {
    let mut dp = Array1::zeros(selection.len());
    let mut density = WeightedRunningAverage::new();

    for (slot, conn_ix) in selection.iter().enumerate() {
        let conn = &topology.connections[conn_ix];

        density.clear();
        for cell in conn.all_cells() {
            let src = sources.well_blocks.get(topology.contributing_cells[cell])?;
            density.add(src[SourceItem::MixtureDensity], src[SourceItem::PoreVol]);
        }

        dp[slot] = pressure_offset(density.value(), conn.depth, gravity, ref_depth);
        log::trace!(
            "Connection {}: reservoir density {}, dp = {}",
            conn_ix,
            density.value(),
            dp[slot]
        );
    }

    Ok(dp)
}

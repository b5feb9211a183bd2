use thiserror::Error;

/// Failures of the block-average pressure calculation.
///
/// Numerical corner cases such as zero total weight or missing neighbours
/// are not errors.
#[derive(Debug, Error)]
pub enum PAvgError {
    #[error("Unsupported WPAVE depth correction flag '{0}'")]
    UnsupportedDepthCorrection(String),

    #[error("No source data for location {0}")]
    UnknownSourceLocation(usize),

    #[error("Activity mask has {actual} entries, expected {expected}")]
    ActivityMaskSize { expected: usize, actual: usize },

    #[error("Connection {connection} is in inactive cell {cell}")]
    InactiveConnectionCell { connection: usize, cell: usize },

    #[error("Source column '{column}' has {actual} entries, expected {expected}")]
    SourceColumnSize {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to parse controls: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

// library
//
// Well block-average pressures (WBP, WBP4, WBP5, WBP9) from the pressures,
// pore volumes and mixture densities of the cells around each connection.

pub mod accumulator;
pub mod calculator;
pub mod connection;
pub mod controls;
pub mod error;
pub mod grid;
pub mod offset;
pub mod source;
pub mod summation;
pub mod topology;

#[cfg(feature = "python")]
mod python;

pub use accumulator::{
    linear_combination, Accumulator, LocalRunningAverages, PAvgResult, WbpMode,
};
pub use calculator::{GlobalCollection, PAvgCalculator, SerialCollection};
pub use connection::{Connection, ConnectionState, Direction};
pub use controls::{DepthCorrection, PAvgControls};
pub use error::PAvgError;
pub use grid::{CellIndexMap, GridDims};
pub use source::{PAvgDynamicSourceData, SourceItem, Sources};

//! Mathematical utilities: parameter grids and summary statistics.

pub mod grid;
pub mod stats;

pub use grid::*;
pub use stats::*;

//! Curve fitting.
//!
//! Responsibilities:
//!
//! - build the objective over the observations (`objective`)
//! - bounded global search (`de`) behind a pluggable trait (`minimizer`)
//! - local polish of the global optimum (`polish`)
//! - orchestration and failure reporting (`fitter`)

pub mod de;
pub mod fitter;
pub mod minimizer;
pub mod objective;
pub mod polish;

pub use de::*;
pub use fitter::*;
pub use minimizer::*;
pub use objective::*;
pub use polish::*;

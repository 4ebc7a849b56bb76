//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations and curve parameters (`Observation`, `CurveParams`, `ParamBounds`)
//! - run configuration (`FitConfig`, `SynthConfig`, `LossKind`)
//! - fit outputs (`FitResult`, `PointResidual`, `SampleRow`, `FitFile`)

pub mod types;

pub use types::*;

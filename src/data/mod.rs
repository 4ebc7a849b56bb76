//! Synthetic datasets for exercising the fitter.

pub mod sample;

pub use sample::*;

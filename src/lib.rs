//! `spiral-fit` library crate.
//!
//! Fits the angle `θ`, growth rate `M` and offset `X` of the curve
//!
//! ```text
//! x(t) = t·cos θ − e^{M|t|}·sin(0.3t)·sin θ + X
//! y(t) = 42 + t·sin θ + e^{M|t|}·sin(0.3t)·cos θ
//! ```
//!
//! to observed points by minimizing a mean L1 distance with bounded
//! differential evolution followed by a Nelder–Mead polish.
//!
//! The binary (`spiral`) is a thin wrapper around this library so the fit is
//! testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

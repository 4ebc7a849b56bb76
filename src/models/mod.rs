//! The spiral curve model.
//!
//! Implemented as small, pure functions so that the objective and reporting code
//! can stay generic.

pub mod model;

pub use model::*;

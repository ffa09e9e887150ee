//! Inverse problem: recover model parameters from a measured χT(T) curve.
//!
//! Responsibilities:
//!
//! - restrict the data to the temperature window where χT actually changes
//! - run damped least squares over `(dH, dS, W, gamma)` with a forward sweep
//!   as the model (finite-difference columns evaluated in parallel)

pub mod active_range;
pub mod fitter;

pub use active_range::*;
pub use fitter::*;

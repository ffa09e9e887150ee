//! Numerical utilities: least squares, finite differences, interpolation and
//! one-dimensional maximisation.

pub mod diff;
pub mod golden;
pub mod interp;
pub mod ols;

pub use diff::*;
pub use golden::*;
pub use interp::*;
pub use ols::*;

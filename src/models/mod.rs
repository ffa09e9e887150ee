//! Gibbs free-energy model of a binuclear spin-crossover system.
//!
//! The model is implemented as small, pure functions of `(T, composition)` so
//! that the solver, the sweep and the fitter can stay generic.

pub mod gibbs;

pub use gibbs::*;

//! Equilibrium solver: damped Newton (Levenberg–Marquardt) on the stationarity
//! conditions of the free-energy surface.

pub mod equilibrium;

pub use equilibrium::*;

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the physical model record (`ModelParameters`) and the gas constant
//! - equilibrium compositions (`EquilibriumPoint`) and sweep outputs (`TemperatureSeries`)
//! - experimental observations and fit outputs (`Observation`, `FitResult`, `FitFile`)
//! - run configuration records derived from CLI flags (`SweepConfig`, `FitConfig`, `SynthConfig`)

pub mod types;

pub use types::*;

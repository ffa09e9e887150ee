//! Temperature sweeps and the observables derived from them.
//!
//! - `continuation`: warm-started solves across an increasing temperature grid
//! - `observables`: susceptibility, enthalpy and heat capacity of a finished series
//! - `transition`: transition temperatures from the heat-capacity curve

pub mod continuation;
pub mod observables;
pub mod transition;

pub use continuation::*;
pub use observables::*;
pub use transition::*;

//! Reporting utilities: formatted terminal output for fits and sweeps.

pub mod format;

pub use format::*;

//! `sco-model` library crate.
//!
//! A three-state (SS, SQ, QQ) spin-crossover model:
//!
//! - equilibrium compositions from a damped Newton root finder (`solver`)
//! - warm-started temperature sweeps, heat capacity and transition
//!   temperatures (`sweep`)
//! - recovery of `(dH, dS, W, gamma)` from a measured χT(T) curve (`fit`)
//!
//! The binary (`sco`) is a thin wrapper around this library so that core
//! logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod solver;
pub mod sweep;

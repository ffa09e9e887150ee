//! Input/output helpers.
//!
//! - delimited table reader shared by every input file (`table`)
//! - parameter files for the fit and sweep entry points (`params`)
//! - multi-system sweep input (`systems`)
//! - experimental χT(T) data + validation (`experimental`)
//! - series CSV, observation files and fit JSON (`export`)

pub mod experimental;
pub mod export;
pub mod params;
pub mod systems;
pub mod table;

pub use experimental::*;
pub use export::*;
pub use params::*;
pub use systems::*;
pub use table::*;

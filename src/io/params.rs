//! Parameter files: one header row and exactly one data row.
//!
//! - fit entry point: `xT_max dH dS W gamma`
//! - sweep entry point: `R f Tini Tfin dT`

use std::path::Path;

use crate::domain::{ModelParameters, TemperatureRange};
use crate::error::ModelError;
use crate::io::table::{Table, read_table};

/// Starting point of an inverse fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParameterFile {
    pub chi_t_max: f64,
    pub initial: ModelParameters,
}

/// Shared settings of a multi-system forward sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParameterFile {
    pub gas_constant: f64,
    /// Interaction strength as a multiple of the critical value `2R·dH/dS`.
    pub gamma_factor: f64,
    pub range: TemperatureRange,
}

pub fn read_fit_parameters(path: &Path) -> Result<FitParameterFile, ModelError> {
    fit_parameters_from_table(&read_table(path)?)
}

pub fn read_sweep_parameters(path: &Path) -> Result<SweepParameterFile, ModelError> {
    sweep_parameters_from_table(&read_table(path)?)
}

pub fn fit_parameters_from_table(table: &Table) -> Result<FitParameterFile, ModelError> {
    let v = single_row(table, 5)?;
    let parsed = FitParameterFile {
        chi_t_max: v[0],
        initial: ModelParameters::new(v[1], v[2], v[3], v[4]),
    };
    if parsed.chi_t_max <= 0.0 {
        return Err(ModelError::invalid(format!(
            "{}: xT_max must be positive (got {})",
            table.source, parsed.chi_t_max
        )));
    }
    Ok(parsed)
}

pub fn sweep_parameters_from_table(table: &Table) -> Result<SweepParameterFile, ModelError> {
    let v = single_row(table, 5)?;
    let parsed = SweepParameterFile {
        gas_constant: v[0],
        gamma_factor: v[1],
        range: TemperatureRange::new(v[2], v[3], v[4]),
    };
    if parsed.gas_constant <= 0.0 {
        return Err(ModelError::invalid(format!(
            "{}: R must be positive (got {})",
            table.source, parsed.gas_constant
        )));
    }
    parsed
        .range
        .validate()
        .map_err(|e| ModelError::invalid(format!("{}: {e}", table.source)))?;
    Ok(parsed)
}

fn single_row(table: &Table, columns: usize) -> Result<Vec<f64>, ModelError> {
    let [row] = table.rows.as_slice() else {
        return Err(ModelError::invalid(format!(
            "{}: expected exactly one data row after the header, found {}",
            table.source,
            table.rows.len()
        )));
    };
    table.expect_columns(columns)?;
    (0..columns).map(|c| table.number(row, c)).collect()
}

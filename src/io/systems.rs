//! Multi-system sweep input: `name dH dS W` per row.
//!
//! `gamma` is not stored; each row gets `f · 2R·dH/dS` from the sweep
//! parameter file.

use std::collections::HashSet;
use std::path::Path;

use crate::domain::{ModelParameters, SystemSpec};
use crate::error::ModelError;
use crate::io::table::{Table, read_table};

pub fn read_systems(
    path: &Path,
    gas_constant: f64,
    gamma_factor: f64,
) -> Result<Vec<SystemSpec>, ModelError> {
    systems_from_table(&read_table(path)?, gas_constant, gamma_factor)
}

pub fn systems_from_table(
    table: &Table,
    gas_constant: f64,
    gamma_factor: f64,
) -> Result<Vec<SystemSpec>, ModelError> {
    if table.rows.is_empty() {
        return Err(ModelError::invalid(format!("{}: no systems listed", table.source)));
    }
    table.expect_columns(4)?;

    let mut seen = HashSet::new();
    table
        .rows
        .iter()
        .map(|row| {
            let name = &row.fields[0];
            validate_system_name(name)
                .map_err(|e| ModelError::invalid(format!("{}:{}: {e}", table.source, row.line)))?;
            if !seen.insert(name.as_str()) {
                return Err(ModelError::invalid(format!(
                    "{}:{}: system '{name}' is listed twice",
                    table.source, row.line
                )));
            }
            let dh = table.number(row, 1)?;
            let ds = table.number(row, 2)?;
            let w = table.number(row, 3)?;
            if ds == 0.0 {
                return Err(ModelError::invalid(format!(
                    "{}:{}: dS must be non-zero",
                    table.source, row.line
                )));
            }
            Ok(SystemSpec {
                name: name.clone(),
                params: ModelParameters::with_gamma_factor(dh, ds, w, gamma_factor, gas_constant),
            })
        })
        .collect()
}

/// System names become export file stems (`<name>.csv`), so they must be a
/// single plain path component.
pub fn validate_system_name(name: &str) -> Result<(), ModelError> {
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':', '\0']);
    if !is_plain {
        return Err(ModelError::invalid(format!(
            "system name '{name}' must be a plain file name (no path separators)"
        )));
    }
    Ok(())
}

//! Experimental χT(T) data.
//!
//! Two numeric columns per row; the column order is configurable because the
//! historical files list `χT` first. Rows must be in strictly increasing,
//! positive temperature order.

use std::path::Path;

use crate::domain::{ColumnOrder, Observation};
use crate::error::ModelError;
use crate::io::table::{Table, read_table};

pub fn read_observations(path: &Path, order: ColumnOrder) -> Result<Vec<Observation>, ModelError> {
    observations_from_table(&read_table(path)?, order)
}

pub fn observations_from_table(
    table: &Table,
    order: ColumnOrder,
) -> Result<Vec<Observation>, ModelError> {
    table.expect_columns(2)?;
    let (t_col, chi_col) = match order {
        ColumnOrder::TemperatureFirst => (0, 1),
        ColumnOrder::ChiTFirst => (1, 0),
    };

    let mut observations: Vec<Observation> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let temperature = table.number(row, t_col)?;
        let chi_t = table.number(row, chi_col)?;
        if temperature <= 0.0 {
            return Err(ModelError::invalid(format!(
                "{}:{}: temperature must be positive (got {temperature})",
                table.source, row.line
            )));
        }
        if let Some(prev) = observations.last() {
            if temperature <= prev.temperature {
                return Err(ModelError::invalid(format!(
                    "{}:{}: temperatures must be strictly increasing ({} then {temperature})",
                    table.source, row.line, prev.temperature
                )));
            }
        }
        observations.push(Observation { temperature, chi_t });
    }

    if observations.len() < 2 {
        return Err(ModelError::invalid(format!(
            "{}: need at least two samples, found {}",
            table.source,
            observations.len()
        )));
    }
    Ok(observations)
}

//! Exports.
//!
//! - per-temperature series of a forward sweep (CSV)
//! - observation files in the layout `read_observations` accepts
//! - fit JSON (parameters, quality, predicted curve) for later plotting

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::FitFile;
use crate::domain::Observation;
use crate::error::AppError;
use crate::sweep::SeriesRow;

/// Write a forward-sweep series to CSV.
///
/// Columns: `temperature,x,y,z,c,chi_t,enthalpy,heat_capacity`. The last row
/// leaves `heat_capacity` empty (it is defined per interval).
pub fn write_series_csv(path: &Path, rows: &[SeriesRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(2, format!("Failed to create series CSV '{}': {e}", path.display()))
    })?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write series CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush series CSV: {e}")))?;
    Ok(())
}

/// Write `(T, χT)` samples as a whitespace-delimited table with a header row.
pub fn write_observations(path: &Path, observations: &[Observation]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create data file '{}': {e}", path.display()))
    })?;

    writeln!(file, "T xT")
        .map_err(|e| AppError::new(2, format!("Failed to write data file header: {e}")))?;
    for o in observations {
        writeln!(file, "{:.6} {:.10}", o.temperature, o.chi_t)
            .map_err(|e| AppError::new(2, format!("Failed to write data file row: {e}")))?;
    }
    Ok(())
}

pub fn write_fit_json(path: &Path, fit: &FitFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display()))
    })?;
    let fit: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{ColumnOrder, CurveGrid, FitQuality, ModelParameters, Termination};
    use crate::io::read_observations;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("sco-export-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn observations_reload_unchanged() {
        let dir = scratch("obs");
        let path = dir.join("synthetic.dat");
        let obs = vec![
            Observation { temperature: 100.0, chi_t: 0.125 },
            Observation { temperature: 102.5, chi_t: 0.25 },
        ];
        write_observations(&path, &obs).unwrap();
        let back = read_observations(&path, ColumnOrder::TemperatureFirst).unwrap();
        assert_eq!(back, obs);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn series_csv_has_header_and_blank_last_cp() {
        let dir = scratch("series");
        let path = dir.join("series.csv");
        let row = |t: f64, cp: Option<f64>| SeriesRow {
            temperature: t,
            x: 1.0,
            y: 0.0,
            z: 0.0,
            c: 0.0,
            chi_t: 0.0,
            enthalpy: 0.0,
            heat_capacity: cp,
        };
        write_series_csv(&path, &[row(100.0, Some(1.5)), row(102.0, None)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "temperature,x,y,z,c,chi_t,enthalpy,heat_capacity");
        assert!(lines[1].ends_with(",1.5"));
        assert!(lines[2].ends_with(','));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn fit_json_reloads() {
        let dir = scratch("fit");
        let path = dir.join("fit.json");
        let params = ModelParameters::new(20_000.0, 100.0, 500.0, 1_000.0);
        let fit = FitFile {
            tool: "sco".to_string(),
            generated_at: Utc::now(),
            source: "data.dat".to_string(),
            chi_t_max: 3.5,
            gas_constant: 8.31,
            initial: params,
            params,
            active_range: [124.0, 336.0],
            fit_quality: FitQuality {
                cost: 1e-20,
                rmse: 1e-11,
                n: 107,
                iterations: 8,
                evaluations: 41,
                penalized_trials: 0,
                termination: Termination::StepTolerance,
            },
            residuals: vec![0.0; 3],
            grid: CurveGrid {
                temperature: vec![100.0, 100.1],
                chi_t: vec![0.0, 0.001],
            },
        };
        write_fit_json(&path, &fit).unwrap();
        let back = read_fit_json(&path).unwrap();
        assert_eq!(back, fit);
        std::fs::remove_dir_all(&dir).ok();
    }
}

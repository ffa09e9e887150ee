//! Delimited numeric tables with one header row.
//!
//! Two layouts are accepted:
//! - `.csv` files, read with the `csv` crate (comma separated, fields trimmed)
//! - anything else, split on runs of whitespace (the historical `.dat` layout)
//!
//! Blank lines are skipped. Every row keeps its 1-based line number so errors
//! can point at the offending row.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ModelError;

/// One data row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Header + data rows of one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Parse `row[column]` as a finite number.
    pub fn number(&self, row: &TableRow, column: usize) -> Result<f64, ModelError> {
        let raw = row.fields.get(column).ok_or_else(|| {
            ModelError::invalid(format!(
                "{}:{}: missing column {} (row has {} fields)",
                self.source,
                row.line,
                column + 1,
                row.fields.len()
            ))
        })?;
        let value: f64 = raw.parse().map_err(|_| {
            ModelError::invalid(format!(
                "{}:{}: column {} is not a number: '{raw}'",
                self.source,
                row.line,
                column + 1
            ))
        })?;
        if !value.is_finite() {
            return Err(ModelError::invalid(format!(
                "{}:{}: column {} is not finite: '{raw}'",
                self.source,
                row.line,
                column + 1
            )));
        }
        Ok(value)
    }

    /// Require every data row to have exactly `n` fields.
    pub fn expect_columns(&self, n: usize) -> Result<(), ModelError> {
        if let Some(row) = self.rows.iter().find(|r| r.fields.len() != n) {
            return Err(ModelError::invalid(format!(
                "{}:{}: expected {n} columns, found {}",
                self.source,
                row.line,
                row.fields.len()
            )));
        }
        Ok(())
    }
}

/// Read a table from disk, choosing the layout from the file extension.
pub fn read_table(path: &Path) -> Result<Table, ModelError> {
    let file = File::open(path).map_err(|e| {
        ModelError::invalid(format!("failed to open '{}': {e}", path.display()))
    })?;
    let source = path.display().to_string();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv(file, source)
    } else {
        read_whitespace(BufReader::new(file), source)
    }
}

/// Parse whitespace-delimited text (exposed for in-memory inputs).
pub fn parse_whitespace_table(text: &str, source: &str) -> Result<Table, ModelError> {
    read_whitespace(text.as_bytes(), source.to_string())
}

fn read_csv(file: File, source: String) -> Result<Table, ModelError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| ModelError::invalid(format!("{source}: failed to read CSV header: {e}")))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Records start on line 2 (after the header).
        let line = idx + 2;
        let record = result
            .map_err(|e| ModelError::invalid(format!("{source}:{line}: CSV parse error: {e}")))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line() as usize).unwrap_or(line);
        rows.push(TableRow {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(Table {
        source,
        headers,
        rows,
    })
}

fn read_whitespace<R: BufRead>(reader: R, source: String) -> Result<Table, ModelError> {
    let mut headers = None;
    let mut rows = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let text =
            line.map_err(|e| ModelError::invalid(format!("{source}:{line_no}: read error: {e}")))?;
        let fields: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if fields.is_empty() {
            continue;
        }
        if headers.is_none() {
            headers = Some(fields.iter().map(|f| normalize_header(f)).collect());
        } else {
            rows.push(TableRow {
                line: line_no,
                fields,
            });
        }
    }

    let headers =
        headers.ok_or_else(|| ModelError::invalid(format!("{source}: file is empty")))?;
    Ok(Table {
        source,
        headers,
        rows,
    })
}

fn normalize_header(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

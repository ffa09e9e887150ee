//! Interactive data-file picker for `sco fit` without a DATA argument.
//!
//! Clap handles the structured flags; this module only covers the
//! "run `sco` in a measurement folder and choose a file" case.
//!
//! Candidates are `*.dat`, `*.csv` and `*.txt` files under the working
//! directory, minus the parameter and system files. Each one is previewed
//! through the table reader so the list shows how many samples it holds.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::read_table;

/// How many directory levels below the working directory are searched.
const SEARCH_DEPTH: usize = 4;

const DATA_EXTENSIONS: [&str; 3] = ["dat", "csv", "txt"];

/// File stems that hold run parameters rather than measurements.
const NON_DATA_STEMS: [&str; 2] = ["parameters", "systems"];

/// Directories never worth descending into.
const SKIPPED_DIRS: [&str; 5] = [".git", "target", "node_modules", "output", "debug"];

/// A discovered file plus a one-line preview of its contents.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCandidate {
    pub path: PathBuf,
    pub preview: String,
}

impl DataCandidate {
    fn load(path: PathBuf) -> Self {
        let preview = preview(&path);
        Self { path, preview }
    }
}

/// Ask on stdin which discovered data file to fit.
///
/// A number picks from the list, anything else is taken as a path, `q` cancels.
pub fn prompt_for_data_path() -> Result<PathBuf, AppError> {
    let candidates: Vec<DataCandidate> = discover_data_files()
        .into_iter()
        .map(DataCandidate::load)
        .collect();
    if candidates.is_empty() {
        return Err(AppError::new(
            2,
            "No data files found. Provide one with `sco fit <data.dat>`.",
        ));
    }

    println!("Data files under {}:", display_cwd());
    for (idx, c) in candidates.iter().enumerate() {
        println!("{:>3}) {:<40} {}", idx + 1, relative(&c.path), c.preview);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("File number (1-{}), path, or q: ", candidates.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines.next() else {
            return Err(AppError::new(
                2,
                "No input received. Provide a data file with `sco fit <data.dat>`.",
            ));
        };
        let line = line.map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        match resolve_choice(line.trim(), &candidates) {
            Choice::Quit => return Err(AppError::new(2, "Canceled.")),
            Choice::Picked(path) => match validate_data_path(&path) {
                Ok(path) => return Ok(path),
                Err(err) => println!("{err}"),
            },
            Choice::OutOfRange(n) => {
                println!("No file number {n}; the list has {} entries.", candidates.len())
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Choice {
    Quit,
    Picked(PathBuf),
    OutOfRange(usize),
}

fn resolve_choice(input: &str, candidates: &[DataCandidate]) -> Choice {
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => {
            Choice::Picked(candidates[n - 1].path.clone())
        }
        Ok(n) => Choice::OutOfRange(n),
        Err(_) => Choice::Picked(PathBuf::from(input)),
    }
}

/// Check that `path` names an existing regular file.
///
/// Any extension is accepted; the table reader decides the layout.
pub fn validate_data_path(path: &Path) -> Result<PathBuf, AppError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(path.to_path_buf()),
        Ok(_) => Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        )),
        Err(_) => Err(AppError::new(
            2,
            format!("Data file not found: {}", path.display()),
        )),
    }
}

/// Data files under the working directory, sorted by path.
pub fn discover_data_files() -> Vec<PathBuf> {
    collect_data_files(Path::new("."), SEARCH_DEPTH)
}

fn collect_data_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                if depth < max_depth && !is_skipped_dir(&path) {
                    pending.push((path, depth + 1));
                }
            } else if kind.is_file() && is_data_file(&path) {
                found.push(path);
            }
        }
    }

    found.sort_by_key(|p| relative(p));
    found
}

fn is_data_file(path: &Path) -> bool {
    let has_data_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DATA_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)));
    let is_parameter_file = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| NON_DATA_STEMS.iter().any(|n| stem.eq_ignore_ascii_case(n)));
    has_data_extension && !is_parameter_file
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// `"(n samples, first column a..b)"`, or why the file will not load.
fn preview(path: &Path) -> String {
    let table = match read_table(path) {
        Ok(table) => table,
        Err(_) => return "(unreadable)".to_string(),
    };
    if table.expect_columns(2).is_err() {
        return format!("({} columns, expected 2)", table.headers.len());
    }
    let first: Vec<f64> = table
        .rows
        .iter()
        .filter_map(|row| table.number(row, 0).ok())
        .collect();
    match (first.first(), first.last()) {
        (Some(lo), Some(hi)) => format!("({} samples, first column {lo}..{hi})", table.rows.len()),
        _ => "(no samples)".to_string(),
    }
}

fn relative(path: &Path) -> String {
    path.strip_prefix("./")
        .unwrap_or(path)
        .display()
        .to_string()
}

fn display_cwd() -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| ".".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<DataCandidate> {
        ["a.dat", "b.csv"]
            .into_iter()
            .map(|p| DataCandidate {
                path: PathBuf::from(p),
                preview: String::new(),
            })
            .collect()
    }

    #[test]
    fn data_file_filter() {
        assert!(is_data_file(Path::new("runs/fe2.dat")));
        assert!(is_data_file(Path::new("FE2.CSV")));
        assert!(!is_data_file(Path::new("parameters.dat")));
        assert!(!is_data_file(Path::new("systems.dat")));
        assert!(!is_data_file(Path::new("notes.md")));
    }

    #[test]
    fn choices_resolve_numbers_paths_and_quit() {
        let list = candidates();
        assert_eq!(resolve_choice("2", &list), Choice::Picked(PathBuf::from("b.csv")));
        assert_eq!(resolve_choice("3", &list), Choice::OutOfRange(3));
        assert_eq!(resolve_choice("Q", &list), Choice::Quit);
        assert_eq!(
            resolve_choice("other/run.dat", &list),
            Choice::Picked(PathBuf::from("other/run.dat"))
        );
    }

    #[test]
    fn missing_path_is_rejected() {
        let err = validate_data_path(Path::new("definitely/not/here.dat")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn preview_counts_samples() {
        let dir = std::env::temp_dir().join(format!("sco_picker_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.dat");
        fs::write(&path, "T xT\n100 0.1\n102 0.2\n104 0.4\n").unwrap();
        assert_eq!(preview(&path), "(3 samples, first column 100..104)");
        fs::write(&path, "a b c\n1 2 3\n").unwrap();
        assert_eq!(preview(&path), "(3 columns, expected 2)");
    }
}

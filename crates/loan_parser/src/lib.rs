//! Loan parser crate for historical loan exports.
//!
//! This crate wraps the `csv` library to read loan CSV files into
//! `LoanRecord` rows suitable for feature derivation. Parsing is
//! non-strict: rows that cannot be read are skipped and counted.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use loan_structs::{LoanRecord, NumericColumn, TextColumn};
use thiserror::Error;
use tracing::{debug, info};

/// Cell values treated as missing, following the usual CSV export conventions.
const MISSING_MARKERS: [&str; 8] = ["", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL"];

/// Errors that abort loading a loan table.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV: {0}")]
    Csv(#[source] csv::Error),

    #[error("required columns missing from input: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
}

/// Rows read from a loan export.
#[derive(Debug, Clone, Default)]
pub struct LoanTable {
    /// Successfully read rows, in file order.
    pub records: Vec<LoanRecord>,
    /// Number of data rows that were skipped as malformed.
    pub skipped_rows: usize,
    /// Header names as they appear in the file.
    pub columns: Vec<String>,
}

impl LoanTable {
    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no rows were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Positions of the known columns within a header row.
#[derive(Debug, Default)]
struct ColumnIndex {
    numeric: Vec<(NumericColumn, usize)>,
    text: Vec<(TextColumn, usize)>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        Self {
            numeric: NumericColumn::ALL
                .into_iter()
                .filter_map(|c| position(c.as_str()).map(|i| (c, i)))
                .collect(),
            text: TextColumn::ALL
                .into_iter()
                .filter_map(|c| position(c.as_str()).map(|i| (c, i)))
                .collect(),
        }
    }

    fn record(&self, row: &csv::StringRecord) -> LoanRecord {
        let mut record = LoanRecord::default();

        for &(column, idx) in &self.numeric {
            record.set_numeric(column, row.get(idx).and_then(parse_numeric));
        }
        for &(column, idx) in &self.text {
            record.set_text(column, row.get(idx).and_then(parse_text));
        }

        record
    }
}

/// Loads loan records from a CSV file.
///
/// # Arguments
///
/// * `path` - Path to the CSV file.
/// * `required` - Column names that must be present in the header.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the header cannot be read,
/// or a required column is absent.
pub fn load_loans(path: &Path, required: &[&str]) -> Result<LoanTable, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_loans(file, required)?;

    info!(
        path = %path.display(),
        rows = table.len(),
        skipped = table.skipped_rows,
        "Loaded loan table"
    );

    Ok(table)
}

/// Reads loan records from any CSV source.
///
/// Rows with more fields than the header, or that are not valid UTF-8, are
/// skipped. Rows with fewer fields are kept with the trailing cells missing.
///
/// # Errors
///
/// Returns an error if the header cannot be read or a required column is absent.
pub fn read_loans<R: Read>(source: R, required: &[&str]) -> Result<LoanTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers().map_err(ParseError::Csv)?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|name| !columns.iter().any(|c| c == *name))
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::Schema { missing });
    }

    let index = ColumnIndex::from_headers(&headers);
    let width = headers.len();

    let mut records = Vec::new();
    let mut skipped_rows = 0;

    for (line, row) in reader.records().enumerate() {
        match row {
            Ok(row) if row.len() <= width => records.push(index.record(&row)),
            Ok(row) => {
                debug!(line = line + 2, fields = row.len(), expected = width, "Skipping row with extra fields");
                skipped_rows += 1;
            }
            Err(e) => {
                debug!(line = line + 2, error = %e, "Skipping unreadable row");
                skipped_rows += 1;
            }
        }
    }

    Ok(LoanTable {
        records,
        skipped_rows,
        columns,
    })
}

/// Parses a numeric cell leniently.
///
/// Surrounding whitespace and a trailing `%` are ignored. Unparsable or
/// non-finite cells are treated as missing.
#[must_use]
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if is_missing(trimmed) {
        return None;
    }

    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_text(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!is_missing(trimmed)).then(|| trimmed.to_string())
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

//! CSV source loading.
//!
//! A source file is read in one pass: the first line becomes the
//! [`CsvHeader`], the requested columns are checked against it, and only then
//! are the data lines parsed into [`Row`]s.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::columns::ColumnSpec;

/// One CSV data line, keyed by column name in header order.
pub type Row = IndexMap<String, String>;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("Header does not exist: {0}")]
    HeaderDoesNotExist(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Column names from the first line of a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvHeader {
    names: Vec<String>,
}

impl CsvHeader {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Checks that every requested column exists, failing on the first one
    /// that does not.
    pub fn validate(&self, columns: &ColumnSpec) -> Result<(), PrepareError> {
        match columns.iter().find(|name| !self.contains(name)) {
            Some(missing) => Err(PrepareError::HeaderDoesNotExist(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Returns `(index, name)` for each selected column, in header order.
    ///
    /// An empty spec selects every column.
    pub fn project(&self, columns: &ColumnSpec) -> Vec<(usize, String)> {
        let mut selected: Vec<(usize, String)> = Vec::new();
        for (idx, name) in self.names.iter().enumerate() {
            let wanted = columns.is_empty() || columns.contains(name);
            if wanted && !selected.iter().any(|(_, n)| n == name) {
                selected.push((idx, name.clone()));
            }
        }
        selected
    }
}

/// Parsed contents of a source file, ready to be seeded.
#[derive(Debug, Clone, Default)]
pub struct PreparedData {
    pub header: CsvHeader,
    /// Columns carried by every row, in header order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl PreparedData {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads CSV files into [`PreparedData`].
pub struct CsvSource;

impl CsvSource {
    /// Loads and projects a CSV file from disk.
    pub fn load_file(
        path: impl AsRef<Path>,
        columns: &ColumnSpec,
    ) -> Result<PreparedData, PrepareError> {
        let path = path.as_ref();
        debug!("Reading CSV source {}", path.display());

        let file = std::fs::File::open(path)?;
        Self::load_reader(file, columns)
    }

    /// Loads and projects CSV data from any reader.
    pub fn load_reader<R: Read>(
        reader: R,
        columns: &ColumnSpec,
    ) -> Result<PreparedData, PrepareError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let header = CsvHeader::new(rdr.headers()?.iter());
        header.validate(columns)?;

        let selected = header.project(columns);
        let mut rows = Vec::new();

        for record in rdr.records() {
            let record = record?;
            let row: Row = selected
                .iter()
                .map(|(idx, name)| {
                    let value = record.get(*idx).unwrap_or_default();
                    (name.clone(), value.to_string())
                })
                .collect();
            rows.push(row);
        }

        debug!("Parsed {} rows across {} columns", rows.len(), selected.len());

        Ok(PreparedData {
            header,
            columns: selected.into_iter().map(|(_, name)| name).collect(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZIPS: &str = "zip,city\n10001,New York\n90210,Beverly Hills\n";

    fn load(data: &str, columns: &str) -> Result<PreparedData, PrepareError> {
        CsvSource::load_reader(data.as_bytes(), &ColumnSpec::parse(columns))
    }

    #[test]
    fn test_projects_requested_columns() {
        let data = load(ZIPS, "zip").unwrap();

        assert_eq!(data.columns, vec!["zip"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows[0].get("zip").map(String::as_str), Some("10001"));
        assert_eq!(data.rows[1].get("zip").map(String::as_str), Some("90210"));
        assert!(data.rows.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_empty_spec_keeps_every_column() {
        let data = load(ZIPS, "").unwrap();

        assert_eq!(data.columns, vec!["zip", "city"]);
        let keys: Vec<&str> = data.rows[1].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zip", "city"]);
        assert_eq!(data.rows[1]["city"], "Beverly Hills");
    }

    #[test]
    fn test_projection_follows_header_order() {
        let data = load("a,b,c\n1,2,3\n", "c,a").unwrap();

        assert_eq!(data.columns, vec!["a", "c"]);
        let keys: Vec<&str> = data.rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(data.rows[0]["c"], "3");
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = load(ZIPS, "zip,state").unwrap_err();
        match err {
            PrepareError::HeaderDoesNotExist(name) => assert_eq!(name, "state"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_missing_column_wins() {
        let err = load(ZIPS, "county,zip,state").unwrap_err();
        assert!(matches!(err, PrepareError::HeaderDoesNotExist(ref n) if n == "county"));
    }

    #[test]
    fn test_header_validation_runs_before_rows() {
        // The second data line is malformed; validation must fail first.
        let err = load("zip,city\n10001,New York\n1,2,3,4\n", "state").unwrap_err();
        assert!(matches!(err, PrepareError::HeaderDoesNotExist(_)));
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let err = load(ZIPS, "ZIP").unwrap_err();
        assert!(matches!(err, PrepareError::HeaderDoesNotExist(ref n) if n == "ZIP"));
    }

    #[test]
    fn test_ragged_line_is_a_csv_error() {
        let err = load("zip,city\n10001\n", "").unwrap_err();
        assert!(matches!(err, PrepareError::Csv(_)));
    }

    #[test]
    fn test_quoted_values() {
        let data = load("zip,city\n\"02134\",\"Boston, MA\"\n", "").unwrap();
        assert_eq!(data.rows[0]["zip"], "02134");
        assert_eq!(data.rows[0]["city"], "Boston, MA");
    }

    #[test]
    fn test_header_only_file() {
        let data = load("zip,city\n", "city").unwrap();
        assert!(data.is_empty());
        assert_eq!(data.header.names(), &["zip".to_string(), "city".to_string()]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("zipcode-seed-does-not-exist.csv");
        let err = CsvSource::load_file(&path, &ColumnSpec::all()).unwrap_err();
        assert!(matches!(err, PrepareError::Io(_)));
    }
}

//! Untyped string table shared by both loaders.
//!
//! Rows are kept as raw cells until a loader interprets them, so a table can
//! come from a CSV file, a downloaded CSV body or a census API response.

use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Name used in error messages, usually the source path.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Reads a delimited file with a header row.
    pub fn read_csv(path: &Path, delimiter: u8) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Self::from_reader(path.display().to_string(), file, delimiter)
    }

    /// Parses delimited text from any reader. Ragged rows are rejected.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R, delimiter: u8) -> Result<Self> {
        let name = name.into();
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(table = %name, rows = rows.len(), "Table loaded");
        Ok(Self::new(name, headers, rows))
    }

    /// Index of a required column.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.optional_column(name)
            .ok_or_else(|| PipelineError::missing_column(&self.name, name))
    }

    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Writes the table as CSV, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader_trims_headers() {
        let data = "GEOID , total\n1,2\n3,4\n";
        let table = Table::from_reader("inline", data.as_bytes(), b',').unwrap();

        assert_eq!(table.headers, vec!["GEOID", "total"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column("total").unwrap(), 1);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let table = Table::from_reader("inline", "a,b\n1,2\n".as_bytes(), b',').unwrap();
        let err = table.column("c").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref column, .. } if column == "c"));
    }

    #[test]
    fn test_ragged_row_fails() {
        let result = Table::from_reader("inline", "a,b\n1,2\n3\n".as_bytes(), b',');
        assert!(matches!(result, Err(PipelineError::Csv(_))));
    }

    #[test]
    fn test_custom_delimiter() {
        let table = Table::from_reader("inline", "a\tb\n1\t2\n".as_bytes(), b'\t').unwrap();
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = Table::read_csv(Path::new("/nonexistent/table.csv"), b',').unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let table = Table::new(
            "t",
            vec!["GEOID".into(), "NAME".into()],
            vec![vec!["1".into(), "Tract 1, Somewhere".into()]],
        );

        table.write_csv(&path).unwrap();
        let back = Table::read_csv(&path, b',').unwrap();

        assert_eq!(back.headers, table.headers);
        assert_eq!(back.rows, table.rows);
    }
}

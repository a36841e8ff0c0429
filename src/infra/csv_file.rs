use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::error::Result;
use crate::services::demographic_source::{DemographicSource, SurveyQuery};
use crate::table::Table;

/// Serves a demographic table previously saved by `fetch`, or any CSV with a
/// `GEOID` column and one column per variable code.
pub struct CsvFileSource {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }
}

#[async_trait]
impl DemographicSource for CsvFileSource {
    async fn fetch_tracts(&self, query: &SurveyQuery) -> Result<Table> {
        info!(path = %self.path.display(), query = %query.describe(), "Reading demographic table from file");
        Table::read_csv(&self.path, self.delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CensusVariables;
    use crate::error::PipelineError;

    fn query() -> SurveyQuery {
        SurveyQuery {
            state: "06".into(),
            county: "037".into(),
            year: 2019,
            survey: "acs5".into(),
            variables: CensusVariables::default(),
        }
    }

    #[tokio::test]
    async fn test_reads_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.csv");
        std::fs::write(&path, "GEOID,B03002_001E\n06037101110,10\n").unwrap();

        let table = CsvFileSource::new(&path).fetch_tracts(&query()).await.unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = CsvFileSource::new("/nonexistent/demo.csv")
            .fetch_tracts(&query())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
    }
}

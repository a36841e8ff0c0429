//! Error types for the tract analysis pipeline.
//!
//! Every failure aborts the run. Variants carry the stage that failed and,
//! where one exists, the offending row or tract key.

use std::path::PathBuf;

/// Errors raised while loading, enriching, joining or aggregating tracts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The upstream source has nothing published for the requested parameters.
    #[error("data unavailable from {source_name}: {message}")]
    DataUnavailable {
        source_name: String,
        message: String,
    },

    /// An input file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A loaded table lacks a required column.
    #[error("schema mismatch in {table}: missing column '{column}'")]
    SchemaMismatch { table: String, column: String },

    /// A row violates a required invariant.
    #[error("data integrity violation during {stage} (row {row:?}, key {key:?}): {message}")]
    DataIntegrity {
        stage: &'static str,
        row: Option<usize>,
        key: Option<String>,
        message: String,
    },

    /// A ratio was requested with a zero denominator.
    #[error("arithmetic undefined for tract {key}: {message}")]
    ArithmeticUndefined { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    pub(crate) fn integrity(
        stage: &'static str,
        row: Option<usize>,
        key: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        PipelineError::DataIntegrity {
            stage,
            row,
            key: key.map(str::to_string),
            message: message.into(),
        }
    }

    pub(crate) fn missing_column(table: &str, column: &str) -> Self {
        PipelineError::SchemaMismatch {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

use thiserror::Error;

use crate::model::Side;

/// Errors raised at the edges of a run: config loading, validation and
/// table ingestion. The reconciliation itself never fails.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad delimiter, blank column name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// The column mapping has no entries; every row would share one key.
    #[error("column mapping is empty: at least one source/compare column pair is required")]
    EmptyMapping,
    /// A mapped column is not among the table's headers.
    #[error("{side} table: unknown column '{column}'")]
    UnknownColumn { side: Side, column: String },
    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(String),
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl From<csv::Error> for ReconError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

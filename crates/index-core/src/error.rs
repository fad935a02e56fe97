use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors.
///
/// Recoverable anomalies (unresolved codes, degenerate normalization,
/// insufficient history, zero denominators) are modelled as values in the
/// component that meets them and never reach this type.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Missing source file for {role}: {}", path.display())]
    MissingSourceFile { role: &'static str, path: PathBuf },

    #[error("{role} has no {column:?} column")]
    MissingColumn { role: &'static str, column: String },

    #[error("CSV error in {role}: {source}")]
    Csv {
        role: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {role}: {source}")]
    Json {
        role: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

pub type IndexResult<T> = Result<T, IndexError>;

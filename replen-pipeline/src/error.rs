//! Error types for loading candidate and reference data.
//!
//! Load failures are the only fatal errors in this crate. Once data is in
//! memory the allocation core never fails: bad values degrade to tolerant
//! defaults and get logged instead.

use thiserror::Error;

/// Errors raised while reading candidate CSVs or reference tables.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("invalid JSON reference data: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LoadResult<T> = Result<T, LoadError>;

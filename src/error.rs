//! Error type for the fallible edges of the crate (input, configuration, logging).
//!
//! Query outcomes such as a missing link are values, not errors; see
//! [`crate::query::PathLatency`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: token {token:?} does not follow the LetterLetterNumber format")]
    InvalidToken { line: usize, token: String },

    #[error("Invalid trace: {0:?}")]
    InvalidTrace(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging setup error: {0}")]
    Logging(String),
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }
}

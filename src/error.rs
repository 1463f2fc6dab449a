use std::path::PathBuf;

use thiserror::Error;

/// Result type for declmap library operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Hard failures. Everything recoverable is reported as a
/// [`Diagnostic`](crate::index::Diagnostic) on the index instead.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no parser registered for {0}")]
    UnsupportedLanguage(PathBuf),

    /// The syntax tree provider could not produce a tree for the file.
    #[error("failed to parse {path}: {reason}")]
    Provider { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker task failed: {0}")]
    Join(String),
}

impl ExtractError {
    pub fn provider(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Provider {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

//! Common error types for PDM

use thiserror::Error;

/// Common result type for PDM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the PDM crates.
///
/// The storage-facing variants separate a failed write-side encode
/// (`Serialize`) from a stored value that no longer decodes
/// (`CorruptRecord`): the former points at code, the latter at data, and
/// both carry which column or value was involved.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value failed to encode for a JSON column
    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted column or identifier failed to decode
    #[error("Corrupt stored {what}: {detail}")]
    CorruptRecord { what: &'static str, detail: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input document or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Write-side JSON encode failure for `what`
    pub fn serialize(what: &'static str, source: serde_json::Error) -> Self {
        Self::Serialize { what, source }
    }

    /// Read-side decode failure for `what`
    pub fn corrupt(what: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::CorruptRecord {
            what,
            detail: detail.to_string(),
        }
    }
}

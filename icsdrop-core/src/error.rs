//! Error types for icsdrop operations.

use thiserror::Error;

/// Errors that can occur while reading a feed or producing output from it.
#[derive(Error, Debug)]
pub enum IcsDropError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unsupported recurrence: {0}")]
    UnsupportedRecurrence(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for icsdrop operations.
pub type IcsDropResult<T> = Result<T, IcsDropError>;

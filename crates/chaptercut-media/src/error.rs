//! Error types for chaptercut-media.

use std::io;
use thiserror::Error;

/// Result type for chaptercut-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for chaptercut-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed line in a metadata or subtitle document.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Timestamp text that matches no supported format.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl Error {
    /// Create a parse error for the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid timestamp error.
    pub fn invalid_timestamp(text: impl Into<String>) -> Self {
        Self::InvalidTimestamp(text.into())
    }
}

//! Error types for xmlcst operations
//!
//! Malformed markup is never reported here: document errors live in the
//! tree as error markers. These errors cover misuse of the API and internal
//! contract breaches.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for xmlcst operations
#[derive(Debug, Error)]
pub enum XmlCstError {
    /// The requested range does not describe a slice of the buffer
    #[error("Invalid range {start}..{end} for a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// An internal contract was broken, e.g. the trivia filter hid a
    /// structural token or the tree lost input bytes
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Range,
    Invariant,
    Config,
    Io,
    Internal,
}

impl XmlCstError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            XmlCstError::InvalidRange { .. } => ErrorKind::Range,
            XmlCstError::InvariantViolation { .. } => ErrorKind::Invariant,
            XmlCstError::ConfigError { .. } => ErrorKind::Config,
            XmlCstError::IoError { .. } => ErrorKind::Io,
            XmlCstError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (the caller can retry with other input)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Range)
    }

    pub fn invalid_range(start: usize, end: usize, len: usize) -> Self {
        Self::InvalidRange { start, end, len }
    }

    /// Create an invariant violation error
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for XmlCstError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

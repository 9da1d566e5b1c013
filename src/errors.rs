//! Error handling for the ballot store

use std::path::PathBuf;

/// Result type alias for the ballot store
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ballot store
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Reading or writing the persisted record file failed
    #[error("Persistence error on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted line could not be turned into a vote record
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: RecordError },

    /// Reading from or writing to the interactive console failed
    #[error("Console I/O error: {0}")]
    Console(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed: {field}")]
    Validation { field: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Why a single persisted line was rejected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("missing ':' delimiter")]
    MissingDelimiter,

    #[error("invalid voter id: {0}")]
    InvalidVoterId(String),

    #[error("candidate index {0:?} is not a non-negative integer")]
    InvalidIndex(String),

    #[error("candidate index {index} is out of range for {candidates} candidates")]
    IndexOutOfRange { index: usize, candidates: usize },
}

impl Error {
    /// Create a new persistence error for `path`
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Create a new malformed-record error
    pub fn malformed(line: usize, reason: RecordError) -> Self {
        Self::MalformedRecord { line, reason }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error came from the storage backend
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::Error::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::Error::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::validation(format!($fmt, $($arg)*))
    };
}

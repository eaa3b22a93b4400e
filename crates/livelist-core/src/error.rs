//! Error types for livelist.
//!
//! Store, decoding and lookup failures all surface as [`LiveListError`]. The
//! list controller never returns these to its callers; they are routed to the
//! [`Diagnostics`](crate::diagnostics::Diagnostics) collaborator instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the livelist crate.
#[derive(Debug, Error)]
pub enum LiveListError {
    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Query errors
    #[error("Entity not found: {entity}")]
    EntityNotFound { entity: String },

    #[error("Failed to decode {entity} object {id}: {message}")]
    Decode {
        entity: String,
        id: String,
        message: String,
    },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    // Generic errors
    #[error("Unknown error")]
    Unknown,
}

/// Result type alias for livelist operations.
pub type Result<T> = std::result::Result<T, LiveListError>;

/// Coarse classification of a [`LiveListError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownError,
    StoreFailure,
    DecodeFailure,
    InvalidRequest,
}

impl ErrorCode {
    /// Stable integer value of the code.
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::UnknownError => 1,
            ErrorCode::StoreFailure => 2,
            ErrorCode::DecodeFailure => 3,
            ErrorCode::InvalidRequest => 4,
        }
    }
}

// Conversion implementations for common error types

impl From<std::io::Error> for LiveListError {
    fn from(err: std::io::Error) -> Self {
        LiveListError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LiveListError {
    fn from(err: serde_json::Error) -> Self {
        LiveListError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for LiveListError {
    fn from(err: rusqlite::Error) -> Self {
        LiveListError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl LiveListError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LiveListError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Classify this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LiveListError::Database { .. }
            | LiveListError::Io { .. }
            | LiveListError::LockPoisoned(_) => ErrorCode::StoreFailure,

            LiveListError::Json { .. } | LiveListError::Decode { .. } => {
                ErrorCode::DecodeFailure
            }

            LiveListError::EntityNotFound { .. } => ErrorCode::InvalidRequest,

            LiveListError::Unknown => ErrorCode::UnknownError,
        }
    }
}

//! Error types for gores-core.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using gores-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for gores operations
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // Lookup errors
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // Booking errors
    #[error("Booking conflicts with an existing entry: {0}")]
    Conflict(String),

    // Auth errors
    #[error("invalid username or password")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed input error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a booking conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Internal errors are the ones caused by the data store or the process
    /// environment rather than by the caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::LockPoisoned | Self::Io(_) | Self::Other(_)
        )
    }

    /// HTTP status reported to the client for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::LockPoisoned | Self::Io(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Internal details stay in the log.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        }
    }
}

//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body exceeds the accepted size.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Operation not supported by the active storage backend.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata record could not be written after the object was stored.
    #[error("Metadata write failed for {path}: {message}")]
    MetadataWrite {
        /// Path of the object that was stored without a record.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// Object and record were committed but no URL could be issued.
    #[error("URL unavailable for {path} (record {file_id}): {message}")]
    UrlUnavailable {
        /// Path of the stored object.
        path: String,
        /// Id of the written record.
        file_id: String,
        /// Underlying failure.
        message: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 422,
            Self::PayloadTooLarge(_) => 413,
            Self::Unsupported(_) => 400,
            Self::Storage(_)
            | Self::MetadataWrite { .. }
            | Self::UrlUnavailable { .. }
            | Self::Database(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Unsupported(_) => "UNSUPPORTED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::MetadataWrite { .. } => "METADATA_WRITE_ERROR",
            Self::UrlUnavailable { .. } => "URL_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

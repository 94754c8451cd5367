//! File operation error types.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::{PathError, StorageError};

/// Failures of the record store behind [`super::FileRepository`].
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Database call failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be turned into a record.
    #[error("invalid file record: {0}")]
    InvalidRecord(String),
}

impl MetadataError {
    /// Create a database error.
    #[must_use]
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

/// File operation errors.
#[derive(Debug, Error)]
pub enum FileError {
    /// Missing or malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Path failed normalization.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// No object at the path.
    #[error("file not found: {path}")]
    NotFound {
        /// Requested path.
        path: String,
    },

    /// No `File` record with this id.
    #[error("file record not found: {0}")]
    RecordNotFound(Uuid),

    /// Upload body larger than allowed.
    #[error("file exceeds maximum allowed size of {max} bytes")]
    FileTooLarge {
        /// Maximum allowed size.
        max: u64,
    },

    /// The active backend lacks the capability.
    #[error("not supported: {0}")]
    Unsupported(String),

    /// Backend failure.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Bytes are stored at `path` but the `File` record was not written.
    #[error("file stored at {path} but its record could not be written: {message}")]
    MetadataWrite {
        /// Path of the stored object.
        path: String,
        /// Record store failure.
        message: String,
    },

    /// Object and record are committed but no URL could be issued for them.
    #[error("file stored at {path} as record {file_id} but no url could be issued: {message}")]
    UrlUnavailable {
        /// Path of the stored object.
        path: String,
        /// Id of the written record.
        file_id: Uuid,
        /// Issuer failure.
        message: String,
    },

    /// Record store failure outside of an upload.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

impl FileError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// True for input errors raised before any backend call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidPath(_))
    }
}

impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound { path: key },
            StorageError::FileTooLarge { max, .. } => Self::FileTooLarge { max },
            StorageError::InvalidKey(e) => Self::InvalidPath(e),
            StorageError::PresignNotSupported => {
                Self::Unsupported("temporary urls require a signing backend".to_string())
            }
            StorageError::Unsupported(what) => Self::Unsupported(what),
            other => Self::Storage(other),
        }
    }
}

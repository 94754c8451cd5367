//! Storage error types.

use thiserror::Error;

use super::path::PathError;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload body exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Bytes received before the limit was hit.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Object not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Operation not available on this backend.
    #[error("operation not supported by storage backend: {0}")]
    Unsupported(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Reading the upload body failed.
    #[error("failed to read upload body: {0}")]
    Body(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(#[from] PathError),

    /// Copy to the destination succeeded but the original could not be removed.
    ///
    /// Both `from` and `to` exist after this error.
    #[error("move from {from} to {to} incomplete, original left in place: {reason}")]
    MoveIncomplete {
        /// Source key, still present.
        from: String,
        /// Destination key, already written.
        to: String,
        /// Failure reported while deleting the source.
        reason: String,
    },
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Returns true for the not-found case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::Unsupported(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opendal_not_found_maps_to_not_found() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "missing");
        assert!(StorageError::from(err).is_not_found());
    }

    #[test]
    fn test_opendal_unsupported_keeps_operation_context() {
        let err = opendal::Error::new(opendal::ErrorKind::Unsupported, "copy is not supported");
        assert!(matches!(
            StorageError::from(err),
            StorageError::Unsupported(ref msg) if msg.contains("copy is not supported")
        ));
    }

    #[test]
    fn test_other_opendal_errors_keep_message() {
        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied");
        let mapped = StorageError::from(err);
        assert!(matches!(mapped, StorageError::Operation(ref msg) if msg.contains("denied")));
    }

    #[test]
    fn test_move_incomplete_display() {
        let err = StorageError::MoveIncomplete {
            from: "x/y.txt".into(),
            to: "z/y.txt".into(),
            reason: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "move from x/y.txt to z/y.txt incomplete, original left in place: permission denied"
        );
    }
}

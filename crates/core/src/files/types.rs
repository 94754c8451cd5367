//! File types and data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{ByteStream, StoragePath, StoredObject};

/// Persisted record of an upload.
///
/// `path` is the key at upload time. Moves and deletes do not update it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Record ID.
    pub id: Uuid,
    /// Name supplied by the client.
    pub filename: String,
    /// Storage key at upload time.
    pub path: String,
    /// MIME type supplied by the client.
    pub mime_type: Option<String>,
    /// Size in bytes at upload time.
    pub size: i64,
    /// Uploading user, if known.
    pub uploaded_by: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a [`FileRecord`].
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Name supplied by the client.
    pub filename: String,
    /// Storage key.
    pub path: String,
    /// MIME type supplied by the client.
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub size: i64,
    /// Uploading user, if known.
    pub uploaded_by: Option<Uuid>,
}

/// An upload request.
pub struct UploadInput {
    /// File content.
    pub body: ByteStream,
    /// Original file name.
    pub filename: String,
    /// MIME type reported by the client.
    pub mime_type: Option<String>,
    /// Target folder; the configured default when absent or blank.
    pub folder: Option<String>,
    /// Uploading user.
    pub uploaded_by: Option<Uuid>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    /// Generated storage key.
    pub path: StoragePath,
    /// Public or signed URL of the new object.
    pub url: String,
    /// Created record.
    pub file: FileRecord,
}

/// An open download.
pub struct Download {
    /// Object metadata.
    pub object: StoredObject,
    /// Object content.
    pub body: ByteStream,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}

impl Download {
    /// Name to offer the client: the last path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.object.path.file_name().unwrap_or("download")
    }
}

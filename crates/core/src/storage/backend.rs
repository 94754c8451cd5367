//! The capability set every storage backend implements.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::body::ByteStream;
use super::error::StorageError;
use super::path::StoragePath;

/// Which physical storage a backend talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local filesystem.
    Local,
    /// Remote S3-compatible object store.
    Remote,
}

impl BackendKind {
    /// Legacy rule: `production` uses the remote store, everything else is local.
    #[must_use]
    pub fn for_run_mode(run_mode: &str) -> Self {
        if run_mode == "production" {
            Self::Remote
        } else {
            Self::Local
        }
    }

    /// Stable name used in logs and config.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "s3",
        }
    }
}

/// How browser-usable URLs are produced for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlAccess {
    /// Objects are publicly readable under `base_url`.
    Public {
        /// Base URL the backend root is served from.
        base_url: String,
    },
    /// Objects are private; access requires a presigned URL.
    Signed,
}

/// A stored object as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// Object key.
    pub path: StoragePath,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, best effort.
    pub mime_type: Option<String>,
}

/// Kind of an immediate child returned by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An object.
    File,
    /// A directory or common key prefix.
    Folder,
}

/// One immediate child of a listed folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Full key of the child.
    pub path: StoragePath,
    /// File or folder.
    pub kind: EntryKind,
}

/// Lazily paginated listing of a folder's immediate children.
pub type EntryStream = BoxStream<'static, Result<ListEntry, StorageError>>;

/// Raw storage operations over normalized paths.
///
/// Implementations are selected once at startup and shared behind an `Arc`.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Physical storage kind.
    fn kind(&self) -> BackendKind;

    /// URL policy for this backend.
    fn url_access(&self) -> &UrlAccess;

    /// Stores `body` at `path`, replacing any existing object.
    async fn put(
        &self,
        path: &StoragePath,
        body: ByteStream,
        mime_type: Option<&str>,
    ) -> Result<StoredObject, StorageError>;

    /// Opens an object for streaming reads.
    async fn get(&self, path: &StoragePath) -> Result<(StoredObject, ByteStream), StorageError>;

    /// Object metadata. `NotFound` if absent or not a file.
    async fn stat(&self, path: &StoragePath) -> Result<StoredObject, StorageError>;

    /// Removes an object.
    async fn delete(&self, path: &StoragePath) -> Result<(), StorageError>;

    /// Moves an object. Not atomic unless the service renames natively.
    async fn rename(&self, from: &StoragePath, to: &StoragePath) -> Result<(), StorageError>;

    /// Immediate children of `folder`. A missing folder lists as empty.
    async fn list(&self, folder: &StoragePath) -> Result<EntryStream, StorageError>;

    /// Presigned GET URL valid for `ttl`.
    async fn presign_read(&self, path: &StoragePath, ttl: Duration)
    -> Result<String, StorageError>;

    /// Permanent URL for `path`. Only publicly readable backends have one.
    fn public_url(&self, path: &StoragePath) -> Result<String, StorageError> {
        match self.url_access() {
            UrlAccess::Public { base_url } => Ok(super::url::public_url(base_url, path)),
            UrlAccess::Signed => Err(StorageError::Unsupported(format!(
                "{} backend has no public urls",
                self.kind().name()
            ))),
        }
    }

    /// Whether an object exists at `path`.
    async fn exists(&self, path: &StoragePath) -> Result<bool, StorageError> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Keys of the objects directly inside `folder`.
    async fn list_immediate_files(
        &self,
        folder: &StoragePath,
    ) -> Result<Vec<StoragePath>, StorageError> {
        collect_kind(self.list(folder).await?, EntryKind::File).await
    }

    /// Keys of the folders directly inside `folder`.
    async fn list_immediate_folders(
        &self,
        folder: &StoragePath,
    ) -> Result<Vec<StoragePath>, StorageError> {
        collect_kind(self.list(folder).await?, EntryKind::Folder).await
    }
}

async fn collect_kind(
    entries: EntryStream,
    kind: EntryKind,
) -> Result<Vec<StoragePath>, StorageError> {
    entries
        .try_filter_map(|entry| async move {
            Ok::<_, StorageError>((entry.kind == kind).then_some(entry.path))
        })
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_for_run_mode() {
        assert_eq!(BackendKind::for_run_mode("production"), BackendKind::Remote);
        assert_eq!(BackendKind::for_run_mode("development"), BackendKind::Local);
        assert_eq!(BackendKind::for_run_mode("staging"), BackendKind::Local);
        assert_eq!(BackendKind::for_run_mode(""), BackendKind::Local);
    }

    #[test]
    fn test_backend_kind_name() {
        assert_eq!(BackendKind::Local.name(), "local");
        assert_eq!(BackendKind::Remote.name(), "s3");
    }
}

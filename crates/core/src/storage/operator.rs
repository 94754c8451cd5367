//! Storage backends implemented on Apache OpenDAL operators.

use std::path::{Component, Path};
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use opendal::layers::{TimeoutLayer, TracingLayer};
use opendal::{ErrorKind, Metadata, Operator, Writer, services};
use tracing::warn;

use super::backend::{
    BackendKind, EntryKind, EntryStream, ListEntry, StorageBackend, StoredObject, UrlAccess,
};
use super::body::{ByteStream, size_limit_of};
use super::config::StorageProvider;
use super::error::StorageError;
use super::path::{PathError, StoragePath};

/// Directory below the local root where uploads are staged until complete.
pub const PARTIAL_DIR: &str = ".partial";

/// A storage backend driven by an OpenDAL operator.
///
/// `Local` wraps the `fs` service and hands out public URLs; `Remote` wraps
/// the `s3` service and hands out presigned URLs.
#[derive(Debug, Clone)]
pub struct OperatorBackend {
    operator: Operator,
    kind: BackendKind,
    access: UrlAccess,
    reserved: Option<&'static str>,
}

impl OperatorBackend {
    /// Builds the backend for a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
                timeout_secs,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                let timeout = Duration::from_secs(*timeout_secs);
                let operator = Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .layer(
                        TimeoutLayer::new()
                            .with_timeout(timeout)
                            .with_io_timeout(timeout),
                    )
                    .layer(TracingLayer)
                    .finish();

                Ok(Self::new(operator, BackendKind::Remote, UrlAccess::Signed))
            }
            StorageProvider::LocalFs {
                root,
                public_base_url,
            } => {
                let partial = root.join(PARTIAL_DIR);
                let builder = services::Fs::default()
                    .root(
                        root.to_str()
                            .ok_or_else(|| StorageError::configuration("invalid path"))?,
                    )
                    .atomic_write_dir(
                        partial
                            .to_str()
                            .ok_or_else(|| StorageError::configuration("invalid path"))?,
                    );

                let operator = Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .layer(TracingLayer)
                    .finish();

                let mut backend = Self::new(
                    operator,
                    BackendKind::Local,
                    UrlAccess::Public {
                        base_url: public_base_url.trim_end_matches('/').to_string(),
                    },
                );
                backend.reserved = Some(PARTIAL_DIR);
                Ok(backend)
            }
        }
    }

    /// Wraps an already configured operator.
    #[must_use]
    pub fn new(operator: Operator, kind: BackendKind, access: UrlAccess) -> Self {
        Self {
            operator,
            kind,
            access,
            reserved: None,
        }
    }

    /// Underlying operator.
    #[must_use]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Key handed to the operator for `path`.
    ///
    /// The local filesystem re-checks that the key stays below the root even
    /// though every `StoragePath` has already been normalized.
    fn key<'a>(&self, path: &'a StoragePath) -> Result<&'a str, StorageError> {
        if let Some(reserved) = self.reserved {
            let key = path.as_str();
            if key == reserved || key.strip_prefix(reserved).is_some_and(|r| r.starts_with('/')) {
                return Err(StorageError::InvalidKey(PathError::Reserved));
            }
        }
        if self.kind == BackendKind::Local {
            let escapes = Path::new(path.as_str())
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                return Err(StorageError::InvalidKey(PathError::Traversal));
            }
        }
        if path.is_root() {
            return Err(StorageError::not_found(path.as_str()));
        }
        Ok(path.as_str())
    }

    fn to_object(path: &StoragePath, meta: &Metadata) -> Result<StoredObject, StorageError> {
        if meta.mode().is_dir() {
            return Err(StorageError::not_found(path.as_str()));
        }
        Ok(StoredObject {
            path: path.clone(),
            size: meta.content_length(),
            mime_type: meta.content_type().map(String::from),
        })
    }

    /// Streams `body` into `writer` and commits it, aborting on any failure.
    ///
    /// Nothing is visible at the key until the final `close` succeeds.
    async fn write_all(
        key: &str,
        writer: &mut Writer,
        body: &mut ByteStream,
    ) -> Result<u64, StorageError> {
        let written = async {
            let mut size = 0u64;
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| match size_limit_of(&e) {
                    Some(limit) => StorageError::file_too_large(limit.size, limit.max),
                    None => StorageError::Body(e.to_string()),
                })?;
                size += chunk.len() as u64;
                writer.write(chunk).await?;
            }
            writer.close().await?;
            Ok::<_, StorageError>(size)
        }
        .await;

        match written {
            Ok(size) => Ok(size),
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(key, error = %abort_err, "Failed to abort partial write");
                }
                Err(e)
            }
        }
    }

    async fn copy_then_delete(&self, from: &str, to: &str) -> Result<(), StorageError> {
        if self.operator.info().full_capability().copy {
            self.operator.copy(from, to).await?;
        } else {
            let data = self.operator.read(from).await?;
            self.operator.write(to, data).await?;
        }

        self.operator
            .delete(from)
            .await
            .map_err(|e| StorageError::MoveIncomplete {
                from: from.to_string(),
                to: to.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl StorageBackend for OperatorBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn url_access(&self) -> &UrlAccess {
        &self.access
    }

    async fn put(
        &self,
        path: &StoragePath,
        mut body: ByteStream,
        mime_type: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        let key = self.key(path)?;

        let mut writer = match mime_type {
            Some(ct) if self.operator.info().full_capability().write_with_content_type => {
                self.operator.writer_with(key).content_type(ct).await?
            }
            _ => self.operator.writer(key).await?,
        };

        let size = Self::write_all(key, &mut writer, &mut body).await?;

        Ok(StoredObject {
            path: path.clone(),
            size,
            mime_type: mime_type.map(String::from),
        })
    }

    async fn get(&self, path: &StoragePath) -> Result<(StoredObject, ByteStream), StorageError> {
        let object = self.stat(path).await?;
        let stream = self
            .operator
            .reader(path.as_str())
            .await?
            .into_bytes_stream(..)
            .await?;
        Ok((object, stream.boxed()))
    }

    async fn stat(&self, path: &StoragePath) -> Result<StoredObject, StorageError> {
        let key = self.key(path)?;
        match self.operator.stat(key).await {
            Ok(meta) => Self::to_object(path, &meta),
            // Some services report a directory addressed without its trailing
            // slash as a mode mismatch rather than as missing.
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::NotFound | ErrorKind::IsADirectory | ErrorKind::NotADirectory
                ) =>
            {
                Err(StorageError::not_found(key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StorageError> {
        let key = self.key(path)?;
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    async fn rename(&self, from: &StoragePath, to: &StoragePath) -> Result<(), StorageError> {
        let (from, to) = (self.key(from)?, self.key(to)?);
        if self.operator.info().full_capability().rename {
            self.operator.rename(from, to).await.map_err(StorageError::from)
        } else {
            self.copy_then_delete(from, to).await
        }
    }

    async fn list(&self, folder: &StoragePath) -> Result<EntryStream, StorageError> {
        if !folder.is_root() {
            self.key(folder)?;
        }
        let dir = folder.dir_key();
        let lister = match self.operator.lister(&dir).await {
            Ok(lister) => lister,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(futures::stream::empty().boxed());
            }
            Err(e) => return Err(e.into()),
        };

        let this = folder.clone();
        let reserved = self.reserved;
        let entries = lister
            .map_err(StorageError::from)
            .try_filter_map(move |entry| {
                futures::future::ready(Ok(to_list_entry(&this, reserved, &entry)))
            })
            .boxed();
        Ok(entries)
    }

    async fn presign_read(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let key = self.key(path)?;
        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Unsupported => StorageError::PresignNotSupported,
                _ => StorageError::from(e),
            })?;
        Ok(presigned.uri().to_string())
    }
}

/// Converts a lister entry into an immediate child of `folder`.
///
/// Listers may echo the listed directory itself; that entry is skipped, as is
/// the reserved staging directory. Keys that are not already in normalized
/// form cannot be addressed through a `StoragePath` and are left out.
fn to_list_entry(
    folder: &StoragePath,
    reserved: Option<&str>,
    entry: &opendal::Entry,
) -> Option<ListEntry> {
    let raw = entry.path();
    let is_dir = raw.ends_with('/') || entry.metadata().mode().is_dir();
    let key = raw.trim_start_matches('/');
    let key = key.strip_suffix('/').unwrap_or(key);

    let path = match StoragePath::from_key(key) {
        Ok(path) if path.as_str() == key => path,
        Ok(path) => {
            warn!(key, normalized = %path, "Skipping listed key that is not in normalized form");
            return None;
        }
        Err(e) => {
            warn!(key, error = %e, "Skipping listed key that is not a valid path");
            return None;
        }
    };

    if path == *folder || reserved == Some(path.as_str()) {
        return None;
    }

    let kind = if is_dir {
        EntryKind::Folder
    } else {
        EntryKind::File
    };
    Some(ListEntry { path, kind })
}

//! File service implementation.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::{FileError, MetadataError};
use super::types::{Download, FileRecord, NewFile, UploadInput, UploadResult};
use crate::storage::body::limit_size;
use crate::storage::{
    AccessUrl, Clock, StorageBackend, StorageConfig, StoragePath, TreeNode, UrlIssuer, list_tree,
    normalize, normalize_object,
};

/// Longest file extension carried over into generated object names.
const MAX_EXTENSION_LEN: usize = 16;

/// Repository trait for `File` record persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait FileRepository: Send + Sync {
    /// Create a new record.
    fn create(
        &self,
        input: NewFile,
    ) -> impl std::future::Future<Output = Result<FileRecord, MetadataError>> + Send;

    /// Find a record by ID.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<FileRecord>, MetadataError>> + Send;
}

/// File operations over the active storage backend.
pub struct FileService<R: FileRepository> {
    issuer: UrlIssuer,
    repo: Arc<R>,
    max_file_size: u64,
    default_folder: String,
}

impl<R: FileRepository> FileService<R> {
    /// Create a new file service.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, repo: Arc<R>, config: &StorageConfig) -> Self {
        Self {
            issuer: UrlIssuer::new(backend, config.signed_url_ttl()),
            repo,
            max_file_size: config.max_file_size,
            default_folder: config.default_folder.clone(),
        }
    }

    /// Replace the clock used for signed URL expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.issuer = self.issuer.with_clock(clock);
        self
    }

    /// Active storage backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        self.issuer.backend()
    }

    /// Stores an upload under a generated name and records it.
    ///
    /// The object is written before the record. If the record cannot be
    /// written the object stays in place and the error names its path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file name is empty or the folder is invalid
    /// - The body exceeds the configured maximum size
    /// - The backend write fails
    /// - The record cannot be written
    pub async fn upload(&self, input: UploadInput) -> Result<UploadResult, FileError> {
        let filename = input.filename.trim();
        if filename.is_empty() {
            return Err(FileError::validation("file name is required"));
        }

        let folder = match input.folder.as_deref().map(str::trim) {
            Some(folder) if !folder.is_empty() => normalize(folder)?,
            _ => normalize(&self.default_folder)?,
        };
        let path = folder.join(&object_name(filename))?;

        let body = limit_size(input.body, self.max_file_size);
        let object = self
            .backend()
            .put(&path, body, input.mime_type.as_deref())
            .await?;

        info!(
            path = %path,
            size = object.size,
            backend = self.backend().kind().name(),
            "File stored"
        );

        let size = i64::try_from(object.size).map_err(|_| FileError::FileTooLarge {
            max: self.max_file_size,
        })?;
        let record = NewFile {
            filename: filename.to_string(),
            path: path.to_string(),
            mime_type: input.mime_type,
            size,
            uploaded_by: input.uploaded_by,
        };

        let file = self.repo.create(record).await.map_err(|e| {
            error!(path = %path, error = %e, "File stored but record write failed");
            FileError::MetadataWrite {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?;

        let url = match self.issuer.url_for(&path).await {
            Ok(url) => url.into_string(),
            Err(e) => {
                error!(path = %path, file_id = %file.id, error = %e, "File stored but no URL issued");
                return Err(FileError::UrlUnavailable {
                    path: path.to_string(),
                    file_id: file.id,
                    message: e.to_string(),
                });
            }
        };

        Ok(UploadResult { path, url, file })
    }

    /// Opens an object for streaming.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid, the object is missing, or the
    /// backend read fails.
    pub async fn download(&self, raw_path: &str) -> Result<Download, FileError> {
        let path = normalize_object(raw_path)?;
        let (object, body) = self.backend().get(&path).await?;

        info!(path = %path, size = object.size, "File download started");

        Ok(Download { object, body })
    }

    /// Time-boxed URL for an existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path is invalid
    /// - The object does not exist
    /// - The active backend cannot sign URLs
    pub async fn temporary_url(&self, raw_path: &str) -> Result<AccessUrl, FileError> {
        let path = normalize_object(raw_path)?;
        let url = self.issuer.signed_url(&path).await?;

        info!(path = %path, expires_at = ?url.expires_at(), "Temporary URL issued");

        Ok(url)
    }

    /// Removes an object, returning its path. `File` records are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid, the object does not exist, or
    /// the backend delete fails.
    pub async fn delete(&self, raw_path: &str) -> Result<StoragePath, FileError> {
        let path = normalize_object(raw_path)?;
        if !self.backend().exists(&path).await? {
            return Err(FileError::not_found(path.as_str()));
        }

        self.backend().delete(&path).await?;
        info!(path = %path, "File deleted");

        Ok(path)
    }

    /// Moves an object. `File` records keep their original path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either path is missing, invalid or both are the same
    /// - The source does not exist
    /// - The backend move fails, including a copy whose source could not be removed
    pub async fn move_file(&self, from: &str, to: &str) -> Result<(), FileError> {
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(FileError::validation("both 'from' and 'to' are required"));
        }
        let from = normalize_object(from)?;
        let to = normalize_object(to)?;
        if from == to {
            return Err(FileError::validation("source and destination are the same"));
        }

        if !self.backend().exists(&from).await? {
            return Err(FileError::not_found(from.as_str()));
        }

        if let Err(e) = self.backend().rename(&from, &to).await {
            warn!(from = %from, to = %to, error = %e, "File move failed");
            return Err(e.into());
        }
        info!(from = %from, to = %to, "File moved");

        Ok(())
    }

    /// Recursive listing of `folder`, or of the root when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder is invalid or a listing fails.
    pub async fn list(&self, folder: Option<&str>) -> Result<TreeNode, FileError> {
        let folder = normalize(folder.unwrap_or_default())?;
        let tree = list_tree(&self.issuer, &folder).await?;

        info!(folder = %folder, entries = tree.children().len(), "Files listed");

        Ok(tree)
    }

    /// Get a `File` record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the lookup fails.
    pub async fn file_record(&self, id: Uuid) -> Result<FileRecord, FileError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(FileError::RecordNotFound(id))
    }
}

/// Collision-resistant object name keeping a sanitized extension.
fn object_name(filename: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match extension(filename) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}

fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();
    (!ext.is_empty()).then_some(ext)
}

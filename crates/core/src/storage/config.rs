//! Storage configuration types.

use std::path::PathBuf;
use std::time::Duration;

use depot_shared::StorageSettings;
use serde::{Deserialize, Serialize};

use super::backend::BackendKind;
use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, MinIO.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
        /// Timeout applied to each remote call, in seconds.
        timeout_secs: u64,
    },
    /// Local filesystem, publicly served under `public_base_url`.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
        /// URL the root directory is served from.
        public_base_url: String,
    },
}

impl StorageProvider {
    /// Default timeout for remote calls.
    pub const DEFAULT_REMOTE_TIMEOUT: u64 = 30;

    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            timeout_secs: Self::DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self::LocalFs {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Backend kind this provider produces.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::S3 { .. } => BackendKind::Remote,
            Self::LocalFs { .. } => BackendKind::Local,
        }
    }

    /// Get the provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Get the bucket name, or the root directory for local storage.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root, .. } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum upload size in bytes.
    pub max_file_size: u64,
    /// Signed URL TTL in seconds (default: 600 = 10 minutes).
    pub signed_url_ttl_secs: u64,
    /// Folder used for uploads that do not name one.
    pub default_folder: String,
}

impl StorageConfig {
    /// Default max file size: 100MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
    /// Default signed URL TTL: 10 minutes.
    pub const DEFAULT_SIGNED_URL_TTL: u64 = 600;
    /// Default upload folder.
    pub const DEFAULT_FOLDER: &'static str = "uploads";

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            signed_url_ttl_secs: Self::DEFAULT_SIGNED_URL_TTL,
            default_folder: Self::DEFAULT_FOLDER.to_string(),
        }
    }

    /// Builds the config from loaded settings.
    ///
    /// An explicit `backend` wins. Without one, the backend follows the run
    /// mode: `production` selects S3, anything else the local filesystem.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown backend name or when S3 is
    /// selected without S3 settings.
    pub fn from_settings(settings: &StorageSettings, run_mode: &str) -> Result<Self, StorageError> {
        let kind = match settings.backend.as_deref().map(str::trim) {
            Some("local" | "fs") => BackendKind::Local,
            Some("s3" | "remote") => BackendKind::Remote,
            Some(other) => {
                return Err(StorageError::configuration(format!(
                    "unknown storage backend '{other}'"
                )));
            }
            None => BackendKind::for_run_mode(run_mode),
        };

        let provider = match kind {
            BackendKind::Local => StorageProvider::local_fs(
                settings.local.root.clone(),
                settings.local.public_base_url.clone(),
            ),
            BackendKind::Remote => {
                let s3 = settings.s3.as_ref().ok_or_else(|| {
                    StorageError::configuration("s3 backend selected but [storage.s3] is missing")
                })?;
                StorageProvider::S3 {
                    endpoint: s3.endpoint.clone(),
                    bucket: s3.bucket.clone(),
                    access_key_id: s3.access_key_id.clone(),
                    secret_access_key: s3.secret_access_key.clone(),
                    region: s3.region.clone(),
                    timeout_secs: s3.timeout_secs,
                }
            }
        };

        Ok(Self {
            provider,
            max_file_size: settings.max_file_size,
            signed_url_ttl_secs: settings.signed_url_ttl_secs,
            default_folder: settings.default_folder.clone(),
        })
    }

    /// Set maximum upload size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set signed URL TTL.
    #[must_use]
    pub fn with_signed_url_ttl(mut self, secs: u64) -> Self {
        self.signed_url_ttl_secs = secs;
        self
    }

    /// Set the default upload folder.
    #[must_use]
    pub fn with_default_folder(mut self, folder: impl Into<String>) -> Self {
        self.default_folder = folder.into();
        self
    }

    /// Signed URL TTL as a duration.
    #[must_use]
    pub const fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

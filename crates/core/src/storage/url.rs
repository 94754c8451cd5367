//! Browser-usable URLs for stored objects.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::backend::{StorageBackend, UrlAccess};
use super::error::StorageError;
use super::path::StoragePath;

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A URL granting read access to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum AccessUrl {
    /// Permanent URL on a publicly readable backend.
    Public {
        /// The URL.
        url: String,
    },
    /// Presigned URL that stops working at `expires_at`.
    Signed {
        /// The URL.
        url: String,
        /// When the URL expires.
        expires_at: DateTime<Utc>,
    },
}

impl AccessUrl {
    /// The URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Public { url } | Self::Signed { url, .. } => url,
        }
    }

    /// Consumes self, returning the URL string.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Public { url } | Self::Signed { url, .. } => url,
        }
    }

    /// Expiry, for signed URLs.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Public { .. } => None,
            Self::Signed { expires_at, .. } => Some(*expires_at),
        }
    }

    /// Whether a fetch at `now` is still authorized by this URL.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires_at| now < expires_at)
    }
}

/// Issues public or signed URLs depending on the backend's access policy.
#[derive(Debug, Clone)]
pub struct UrlIssuer {
    backend: Arc<dyn StorageBackend>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl UrlIssuer {
    /// Create an issuer signing URLs for `ttl`.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to compute expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Backend URLs are issued for.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Configured signed URL lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// URL for an object known to exist.
    ///
    /// Public backends get a deterministic URL without touching storage;
    /// signed backends are presigned without a separate existence check.
    pub async fn url_for(&self, path: &StoragePath) -> Result<AccessUrl, StorageError> {
        match self.backend.url_access() {
            UrlAccess::Public { .. } => Ok(AccessUrl::Public {
                url: self.backend.public_url(path)?,
            }),
            UrlAccess::Signed => self.sign(path).await,
        }
    }

    /// Time-boxed URL for an object that may not exist.
    ///
    /// Fails with `NotFound` rather than signing a URL for a missing object.
    /// The object can still disappear before the URL is used.
    pub async fn signed_url(&self, path: &StoragePath) -> Result<AccessUrl, StorageError> {
        if self.backend.url_access() != &UrlAccess::Signed {
            return Err(StorageError::PresignNotSupported);
        }
        if !self.backend.exists(path).await? {
            return Err(StorageError::not_found(path.as_str()));
        }
        self.sign(path).await
    }

    async fn sign(&self, path: &StoragePath) -> Result<AccessUrl, StorageError> {
        let issued_at = self.clock.now();
        let url = self.backend.presign_read(path, self.ttl).await?;
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);

        Ok(AccessUrl::Signed {
            url,
            expires_at: issued_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }
}

/// Public URL of `path` below `base_url`.
#[must_use]
pub fn public_url(base_url: &str, path: &StoragePath) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.encoded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::body::from_bytes;
    use crate::storage::path::normalize;
    use crate::storage::testing::{FakeClock, FakeRemote};

    #[test]
    fn test_public_url_encodes_segments() {
        let path = normalize("my%20folder/a%23b.txt").unwrap();
        assert_eq!(
            public_url("http://localhost:8080/storage/", &path),
            "http://localhost:8080/storage/my%20folder/a%23b.txt"
        );
    }

    #[test]
    fn test_public_url_never_expires() {
        let url = AccessUrl::Public {
            url: "http://x/a".into(),
        };
        assert!(url.is_valid_at(DateTime::<Utc>::MAX_UTC));
        assert_eq!(url.expires_at(), None);
    }

    #[tokio::test]
    async fn test_signed_url_expires_after_ttl() {
        let clock = Arc::new(FakeClock::default());
        let backend = Arc::new(FakeRemote::new());
        let path = normalize("reports/q1.pdf").unwrap();
        backend.put(&path, from_bytes("pdf"), None).await.unwrap();

        let issuer = UrlIssuer::new(backend, Duration::from_secs(600)).with_clock(clock.clone());
        let url = issuer.signed_url(&path).await.unwrap();

        assert!(url.is_valid_at(clock.now()));
        clock.advance(Duration::from_secs(599));
        assert!(url.is_valid_at(clock.now()));
        clock.advance(Duration::from_secs(1));
        assert!(!url.is_valid_at(clock.now()));
    }

    #[tokio::test]
    async fn test_signed_url_missing_object_is_not_found() {
        let backend = Arc::new(FakeRemote::new());
        let issuer = UrlIssuer::new(backend, Duration::from_secs(600));

        let err = issuer
            .signed_url(&normalize("missing.txt").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_signed_url_requires_signing_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = crate::storage::OperatorBackend::from_provider(
            &crate::storage::StorageProvider::local_fs(dir.path(), "http://localhost/storage"),
        )
        .unwrap();
        let issuer = UrlIssuer::new(Arc::new(backend), Duration::from_secs(600));

        let err = issuer
            .signed_url(&normalize("a.txt").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignNotSupported));
    }
}

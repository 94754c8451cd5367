//! In-memory stand-ins for a remote object store and the wall clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use opendal::raw::{
    Access, Layer, LayeredAccess, OpList, OpRead, OpWrite, RpDelete, RpList, RpRead, RpWrite,
};
use opendal::{Operator, services};

use super::backend::{BackendKind, EntryStream, StorageBackend, StoredObject, UrlAccess};
use super::body::ByteStream;
use super::error::StorageError;
use super::operator::OperatorBackend;
use super::path::StoragePath;
use super::url::Clock;

/// Operator layer whose deletes fail while `fail` is set.
#[derive(Debug, Clone, Default)]
pub struct FailDeleteLayer {
    fail: Arc<AtomicBool>,
}

impl<A: Access> Layer<A> for FailDeleteLayer {
    type LayeredAccess = FailDeleteAccessor<A>;

    fn layer(&self, inner: A) -> Self::LayeredAccess {
        FailDeleteAccessor {
            inner,
            fail: self.fail.clone(),
        }
    }
}

/// Accessor produced by [`FailDeleteLayer`].
#[derive(Debug)]
pub struct FailDeleteAccessor<A: Access> {
    inner: A,
    fail: Arc<AtomicBool>,
}

impl<A: Access> LayeredAccess for FailDeleteAccessor<A> {
    type Inner = A;
    type Reader = A::Reader;
    type Writer = A::Writer;
    type Lister = A::Lister;
    type Deleter = A::Deleter;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn read(&self, path: &str, args: OpRead) -> opendal::Result<(RpRead, Self::Reader)> {
        self.inner.read(path, args).await
    }

    async fn write(&self, path: &str, args: OpWrite) -> opendal::Result<(RpWrite, Self::Writer)> {
        self.inner.write(path, args).await
    }

    async fn list(&self, path: &str, args: OpList) -> opendal::Result<(RpList, Self::Lister)> {
        self.inner.list(path, args).await
    }

    async fn delete(&self) -> opendal::Result<(RpDelete, Self::Deleter)> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(opendal::Error::new(
                opendal::ErrorKind::PermissionDenied,
                "delete refused",
            ));
        }
        self.inner.delete().await
    }
}

/// Flat-keyspace backend that signs URLs like an S3 bucket would.
///
/// Everything except presigning runs through a real [`OperatorBackend`] over
/// the memory service, which has neither native rename nor copy.
#[derive(Debug)]
pub struct FakeRemote {
    inner: OperatorBackend,
    fail_delete: Arc<AtomicBool>,
    fail_presign: AtomicBool,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemote {
    /// Empty bucket.
    pub fn new() -> Self {
        let layer = FailDeleteLayer::default();
        let fail_delete = layer.fail.clone();
        let operator = Operator::new(services::Memory::default())
            .expect("memory operator")
            .layer(layer)
            .finish();
        Self {
            inner: OperatorBackend::new(operator, BackendKind::Remote, UrlAccess::Signed),
            fail_delete,
            fail_presign: AtomicBool::new(false),
        }
    }

    /// Makes every later delete fail at the operator.
    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Makes every later presign fail.
    pub fn fail_presigns(&self) {
        self.fail_presign.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageBackend for FakeRemote {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn url_access(&self) -> &UrlAccess {
        self.inner.url_access()
    }

    async fn put(
        &self,
        path: &StoragePath,
        body: ByteStream,
        mime_type: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        self.inner.put(path, body, mime_type).await
    }

    async fn get(&self, path: &StoragePath) -> Result<(StoredObject, ByteStream), StorageError> {
        self.inner.get(path).await
    }

    async fn stat(&self, path: &StoragePath) -> Result<StoredObject, StorageError> {
        self.inner.stat(path).await
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StorageError> {
        self.inner.delete(path).await
    }

    async fn rename(&self, from: &StoragePath, to: &StoragePath) -> Result<(), StorageError> {
        self.inner.rename(from, to).await
    }

    async fn list(&self, folder: &StoragePath) -> Result<EntryStream, StorageError> {
        self.inner.list(folder).await
    }

    async fn presign_read(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::operation("signing key unavailable"));
        }
        Ok(format!(
            "https://fake-bucket.test/{}?X-Amz-Expires={}",
            path.encoded(),
            ttl.as_secs()
        ))
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FakeClock(Mutex<DateTime<Utc>>);

impl Default for FakeClock {
    fn default() -> Self {
        Self(Mutex::new(
            Utc.with_ymd_and_hms(2026, 1, 8, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }
}

impl FakeClock {
    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().expect("clock lock");
        *now += chrono::Duration::from_std(by).expect("duration in range");
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

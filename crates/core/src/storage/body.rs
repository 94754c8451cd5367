//! Streaming object bodies.

use std::io;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};

/// A stream of body chunks moving in or out of a backend.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Marker carried inside the `io::Error` produced by [`limit_size`].
#[derive(Debug, Clone, Copy)]
pub struct SizeLimitExceeded {
    /// Bytes seen when the limit was crossed.
    pub size: u64,
    /// Configured maximum.
    pub max: u64,
}

impl std::fmt::Display for SizeLimitExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body exceeds {} bytes", self.max)
    }
}

impl std::error::Error for SizeLimitExceeded {}

/// Wraps an in-memory buffer as a single-chunk stream.
pub fn from_bytes(data: impl Into<Bytes>) -> ByteStream {
    let data: Bytes = data.into();
    stream::once(async move { Ok(data) }).boxed()
}

/// Fails the stream with [`SizeLimitExceeded`] once more than `max` bytes pass.
pub fn limit_size(body: ByteStream, max: u64) -> ByteStream {
    body.scan(0u64, move |seen, chunk| {
        let item = chunk.and_then(|bytes| {
            *seen += bytes.len() as u64;
            if *seen > max {
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    SizeLimitExceeded { size: *seen, max },
                ))
            } else {
                Ok(bytes)
            }
        });
        futures::future::ready(Some(item))
    })
    .boxed()
}

/// Extracts the size limit marker from an I/O error, if present.
pub fn size_limit_of(err: &io::Error) -> Option<SizeLimitExceeded> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<SizeLimitExceeded>())
        .copied()
}

/// Collects a stream into one buffer. Intended for small bodies and tests.
pub async fn collect(mut body: ByteStream) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = body.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

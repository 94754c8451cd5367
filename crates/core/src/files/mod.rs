//! File operations over the active storage backend.
//!
//! This module composes path normalization, the storage backend, the URL
//! issuer and the metadata record store into:
//! - Upload with a `File` record
//! - Streaming download
//! - Temporary (signed) URLs
//! - Delete and move
//! - Recursive listing

mod error;
mod service;
mod types;

pub use error::{FileError, MetadataError};
pub use service::{FileRepository, FileService};
pub use types::{Download, FileRecord, NewFile, UploadInput, UploadResult};

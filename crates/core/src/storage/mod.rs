//! Backend-agnostic object storage using Apache OpenDAL.
//!
//! Every request path goes through [`normalize`] before it reaches a backend,
//! so backends only ever see canonical keys below their root.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  normalize(raw) ──► StoragePath                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  select(config) ──► Arc<dyn StorageBackend>                     │
//! │      Local:  services::Fs  + public URLs                        │
//! │      Remote: services::S3  + presigned URLs                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  UrlIssuer::url_for / signed_url      list_tree(issuer, folder) │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
pub mod body;
mod config;
mod error;
mod operator;
mod path;
mod selector;
mod tree;
mod url;

#[cfg(test)]
mod path_props;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    BackendKind, EntryKind, EntryStream, ListEntry, StorageBackend, StoredObject, UrlAccess,
};
pub use body::ByteStream;
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use operator::OperatorBackend;
pub use path::{PathError, StoragePath, normalize, normalize_object};
pub use selector::select;
pub use tree::{TreeNode, list_tree};
pub use url::{AccessUrl, Clock, SystemClock, UrlIssuer, public_url};

//! Backend-agnostic storage engine for Depot.
//!
//! This crate contains the storage engine with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `storage` - Path normalization, storage backends, URL issuing, tree listing
//! - `files` - Upload/download/delete/move orchestration and the metadata record contract

pub mod files;
pub mod storage;

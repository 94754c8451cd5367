//! Startup-time backend selection.

use std::sync::Arc;

use tracing::info;

use super::backend::StorageBackend;
use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::operator::OperatorBackend;

/// Builds the backend named by `config`.
///
/// Called once at startup; the result is shared for the life of the process.
///
/// # Errors
///
/// Returns a configuration error if the provider cannot be initialized.
pub fn select(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    let backend = OperatorBackend::from_provider(&config.provider)?;

    match &config.provider {
        StorageProvider::S3 {
            endpoint, bucket, ..
        } => info!(
            backend = config.provider.name(),
            endpoint = %endpoint,
            bucket = %bucket,
            "Storage backend selected"
        ),
        StorageProvider::LocalFs {
            root,
            public_base_url,
        } => info!(
            backend = config.provider.name(),
            root = %root.display(),
            public_base_url = %public_base_url,
            "Storage backend selected"
        ),
    }

    Ok(Arc::new(backend))
}

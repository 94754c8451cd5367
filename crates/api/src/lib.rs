//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for file operations
//! - Authentication middleware
//! - Error responses
//! - Static serving of the local storage root

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::header::AUTHORIZATION;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use depot_core::files::FileService;
use depot_core::storage::{StorageBackend, StorageConfig, StorageProvider};
use depot_db::FileRecordRepository;
use depot_shared::JwtService;

/// File service backed by the database record store.
pub type Files = FileService<FileRecordRepository>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// File operations over the active storage backend.
    pub files: Arc<Files>,
    /// Storage configuration the backend was selected from.
    pub storage: Arc<StorageConfig>,
}

impl AppState {
    /// Wires the file service to the selected backend and the database.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        backend: Arc<dyn StorageBackend>,
        storage: StorageConfig,
    ) -> Self {
        let repo = Arc::new(FileRecordRepository::new(db));
        let files = FileService::new(backend, repo, &storage);
        Self {
            jwt_service: Arc::new(jwt_service),
            files: Arc::new(files),
            storage: Arc::new(storage),
        }
    }
}

/// Creates the main application router.
///
/// The local storage root is served under `/storage` so that public URLs
/// issued for the local backend resolve.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().nest("/api/v1", routes::api_routes_with_state(state.clone()));

    if let StorageProvider::LocalFs { root, .. } = &state.storage.provider {
        router = router.nest_service("/storage", ServeDir::new(root));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

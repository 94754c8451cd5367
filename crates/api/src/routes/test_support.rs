//! Router test helpers.

use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

use crate::AppState;
use depot_core::storage::{StorageConfig, StorageProvider, select};
use depot_shared::{JwtConfig, JwtService};

/// State over a local backend rooted at `dir`.
pub(crate) fn test_state(dir: &tempfile::TempDir, db: DatabaseConnection) -> AppState {
    let config = StorageConfig::new(StorageProvider::local_fs(
        dir.path(),
        "http://localhost:8080/storage",
    ));
    let backend = select(&config).expect("local backend");
    AppState::new(db, JwtService::new(JwtConfig::default()), backend, config)
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Sends one request and decodes the JSON response body.
pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

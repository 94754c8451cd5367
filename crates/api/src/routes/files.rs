//! Storage routes under `/s3`.
//!
//! Wildcard paths are read with [`RawPathParams`] so the storage normalizer
//! performs the only percent-decoding pass.

use std::io;

use axum::{
    Json, Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, RawPathParams, State,
        multipart::{Field, MultipartError},
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use depot_core::files::UploadInput;
use depot_shared::AppError;

/// Chunks buffered between the multipart reader and the storage writer.
const CHUNK_BUFFER: usize = 8;

/// Allowance for multipart framing and small form fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the storage routes.
pub fn routes(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/s3/upload",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/s3/download/{*path}", get(download))
        .route("/s3/temp-url/{*path}", get(temporary_url))
        .route("/s3/delete/{*path}", delete(delete_file))
        .route("/s3/list", get(list_root))
        .route("/s3/list/{*folder}", get(list_folder))
        .route("/s3/move", post(move_file))
        .route("/s3/files/{id}", get(get_file_record))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for uploads.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Target folder; a `folder` form field takes precedence.
    pub folder: Option<String>,
}

/// Request body for moving a file.
#[derive(Debug, Default, Deserialize)]
pub struct MoveRequest {
    /// Current path.
    #[serde(default)]
    pub from: String,
    /// New path.
    #[serde(default)]
    pub to: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// The still-encoded value of the route's wildcard segment.
fn wildcard(params: &RawPathParams) -> &str {
    params.iter().next().map_or("", |(_, value)| value)
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(AppError::PayloadTooLarge(err.body_text()))
    } else {
        ApiError(AppError::Validation(err.body_text()))
    }
}

/// Feeds a multipart field into the upload body channel until either side ends.
async fn forward(mut field: Field<'_>, mut tx: mpsc::Sender<io::Result<Bytes>>) {
    loop {
        let item = match field.chunk().await {
            Ok(Some(chunk)) => Ok(chunk),
            Ok(None) => break,
            Err(e) => Err(io::Error::other(e.body_text())),
        };
        let failed = item.is_err();
        if tx.send(item).await.is_err() || failed {
            break;
        }
    }
}

/// `Content-Disposition` offering `name` as a download.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(name, NON_ALPHANUMERIC)
    )
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/s3/upload`
/// Multipart upload. A `folder` field must precede the `file` field.
async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut folder = query.folder;

    let uploaded = loop {
        let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e))?
        else {
            return Err(ApiError(AppError::Validation(
                "multipart field 'file' is required".to_string(),
            )));
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("folder") => {
                folder = Some(field.text().await.map_err(|e| multipart_error(&e))?);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(String::from);
                let (tx, rx) = mpsc::channel(CHUNK_BUFFER);

                let input = UploadInput {
                    body: rx.boxed(),
                    filename,
                    mime_type,
                    folder: folder.take(),
                    uploaded_by: Some(auth.user_id()),
                };
                let ((), result) = futures::join!(forward(field, tx), state.files.upload(input));
                break result?;
            }
            _ => {}
        }
    };

    info!(
        user_id = %auth.user_id(),
        file_id = %uploaded.file.id,
        path = %uploaded.path,
        "File uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "File uploaded successfully",
            "file": uploaded.file,
            "path": uploaded.path,
            "url": uploaded.url,
        })),
    )
        .into_response())
}

/// GET `/s3/download/{*path}`
/// Streams the object as an attachment.
async fn download(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Response, ApiError> {
    let download = state.files.download(wildcard(&params)).await?;

    let disposition = content_disposition(download.file_name());
    let content_type = download
        .object
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, download.object.size)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(download.body))
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))
}

/// GET `/s3/temp-url/{*path}`
/// Signed URL for an existing object on a signing backend.
async fn temporary_url(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Json<Value>, ApiError> {
    let url = state.files.temporary_url(wildcard(&params)).await?;

    Ok(Json(json!({
        "status": true,
        "url": url.as_str(),
        "expires_at": url.expires_at(),
    })))
}

/// DELETE `/s3/delete/{*path}`
async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    params: RawPathParams,
) -> Result<Json<Value>, ApiError> {
    let path = state.files.delete(wildcard(&params)).await?;

    info!(user_id = %auth.user_id(), path = %path, "File deleted by user");

    Ok(Json(json!({
        "status": true,
        "message": "File deleted successfully",
        "path": path,
    })))
}

/// GET `/s3/list`
async fn list_root(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    list(&state, None).await
}

/// GET `/s3/list/{*folder}`
async fn list_folder(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Json<Value>, ApiError> {
    list(&state, Some(wildcard(&params))).await
}

async fn list(state: &AppState, folder: Option<&str>) -> Result<Json<Value>, ApiError> {
    let tree = state.files.list(folder).await?;

    Ok(Json(json!({
        "status": true,
        "data": tree.into_children(),
    })))
}

/// POST `/s3/move`
async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    state.files.move_file(&payload.from, &payload.to).await?;

    info!(user_id = %auth.user_id(), from = %payload.from, to = %payload.to, "File moved by user");

    Ok(Json(json!({
        "status": true,
        "message": "File moved successfully",
    })))
}

/// GET `/s3/files/{id}`
async fn get_file_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let file = state.files.file_record(id).await?;

    Ok(Json(json!({
        "status": true,
        "file": file,
    })))
}

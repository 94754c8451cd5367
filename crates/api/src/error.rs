//! HTTP error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use depot_core::files::FileError;
use depot_shared::AppError;

/// An [`AppError`] rendered as `{"status": false, "error", "message"}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Message shown to the client, without the error kind prefix.
    fn message(&self) -> &str {
        match &self.0 {
            AppError::Unauthorized(m)
            | AppError::NotFound(m)
            | AppError::Validation(m)
            | AppError::PayloadTooLarge(m)
            | AppError::Unsupported(m)
            | AppError::Storage(m)
            | AppError::Database(m)
            | AppError::Internal(m)
            | AppError::MetadataWrite { message: m, .. }
            | AppError::UrlUnavailable { message: m, .. } => m,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        let app = match err {
            FileError::Validation(_) | FileError::InvalidPath(_) => {
                AppError::Validation(err.to_string())
            }
            FileError::NotFound { .. } | FileError::RecordNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            FileError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            FileError::Unsupported(_) => AppError::Unsupported(err.to_string()),
            FileError::Storage(_) => AppError::Storage(err.to_string()),
            FileError::MetadataWrite { path, message } => AppError::MetadataWrite { path, message },
            FileError::UrlUnavailable {
                path,
                file_id,
                message,
            } => AppError::UrlUnavailable {
                path,
                file_id: file_id.to_string(),
                message,
            },
            FileError::Metadata(_) => AppError::Database(err.to_string()),
        };
        Self(app)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else {
            warn!(error = %self.0, code = self.0.error_code(), "Request rejected");
        }

        let mut body = json!({
            "status": false,
            "error": self.0.error_code(),
            "message": self.message(),
        });
        match &self.0 {
            AppError::MetadataWrite { path, .. } => body["path"] = json!(path),
            AppError::UrlUnavailable { path, file_id, .. } => {
                body["path"] = json!(path);
                body["file_id"] = json!(file_id);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

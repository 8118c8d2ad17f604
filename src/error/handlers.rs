//! Error handlers
//!
//! Maps server errors onto HTTP status codes and JSON error bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde_json::json;

use crate::error::types::{ServerError, StorageError};

/// Convert error to HTTP status code
pub fn status_code(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Storage(e) => match e {
            StorageError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::Conflict(_) => StatusCode::CONFLICT,
            StorageError::Locked(_) => StatusCode::LOCKED,
            StorageError::InsufficientStorage { .. } => StatusCode::INSUFFICIENT_STORAGE,
            StorageError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServerError::Request(e) => match e {
            crate::error::RequestError::LengthRequired => StatusCode::LENGTH_REQUIRED,
            _ => StatusCode::BAD_REQUEST,
        },
        ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
        ServerError::Archive(_) | ServerError::Config(_) | ServerError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Client-facing message; internal failures don't leak filesystem details.
fn detail(err: &ServerError) -> String {
    match err {
        ServerError::Storage(StorageError::IoError(_))
        | ServerError::IoError(_)
        | ServerError::Config(_) => "Internal server error".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }
        (status, Json(json!({ "detail": detail(&self) }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, PathRejection, RequestError};

    #[test]
    fn maps_upload_failures_to_documented_codes() {
        let cases = [
            (
                ServerError::from(PathRejection::OutsideRoot),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Conflict("a".into()).into(),
                StatusCode::CONFLICT,
            ),
            (RequestError::LengthRequired.into(), StatusCode::LENGTH_REQUIRED),
            (
                RequestError::InvalidInput("x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (StorageError::Locked("a".into()).into(), StatusCode::LOCKED),
            (
                StorageError::InsufficientStorage {
                    required: 10,
                    available: 1,
                }
                .into(),
                StatusCode::INSUFFICIENT_STORAGE,
            ),
            (
                StorageError::IoError(std::io::Error::other("disk")).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StorageError::NotFound("a".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (AuthError::InvalidToken.into(), StatusCode::UNAUTHORIZED),
        ];

        for (err, expected) in cases {
            assert_eq!(status_code(&err), expected, "{err}");
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ServerError::from(StorageError::IoError(std::io::Error::other(
            "/srv/secret/path",
        )));
        assert_eq!(detail(&err), "Internal server error");
    }
}

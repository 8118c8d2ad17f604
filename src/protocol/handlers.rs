//! HTTP handlers
//!
//! Thin adapters between axum extractors and [`FileService`] operations.
//!
//! [`FileService`]: crate::transfer::FileService

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use log::info;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use super::parser::{
    ARCHIVE_HEADER, FILE_SIZE_HEADER, attachment_disposition, parse_archive_flag,
    parse_declared_size, parse_upload_path,
};
use super::responses::{HealthResponse, UploadResponse};
use crate::error::{RequestError, ServerError};
use crate::middleware::AuthenticatedUser;
use crate::server::AppState;
use crate::storage::{DirectoryEntry, DiskUsage};
use crate::transfer::UploadRequest;

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub verbose: bool,
}

/// A header that is present but not visible ASCII is a bad request, not an absent one.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, RequestError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| RequestError::InvalidInput(format!("{} is not valid text", name)))
        })
        .transpose()
}

pub async fn health() -> Json<HealthResponse> {
    info!("Called /health");
    Json(HealthResponse::ok())
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, ServerError> {
    info!("Called /upload by {} (force: {})", user, query.force);

    let request = UploadRequest {
        path: parse_upload_path(header_str(&headers, CONTENT_DISPOSITION.as_str())?)?,
        declared_size: parse_declared_size(headers.get(FILE_SIZE_HEADER)),
        is_archive: parse_archive_flag(header_str(&headers, ARCHIVE_HEADER)?)?,
        force: query.force,
    };

    let outcome = state
        .service
        .upload(request, body.into_data_stream())
        .await?;
    Ok(Json(UploadResponse::new(outcome.file_name)))
}

pub async fn download(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    info!("Called /download for {}", path);

    let download = state.service.download(&path).await?;

    // The guard rides along with the body; dropping the stream removes the archive.
    let transient = download.transient;
    let stream = ReaderStream::new(download.file).map(move |chunk| {
        let _guard = &transient;
        chunk
    });

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (CONTENT_LENGTH, HeaderValue::from(download.size)),
            (CONTENT_DISPOSITION, attachment_disposition(&download.file_name)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(path): Path<String>,
) -> Result<StatusCode, ServerError> {
    info!("Called /delete for {} by {}", path, user);
    state.service.delete(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_root(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DirectoryEntry>>, ServerError> {
    list(state, String::new(), query).await
}

pub async fn list_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DirectoryEntry>>, ServerError> {
    list(state, path, query).await
}

async fn list(
    state: AppState,
    path: String,
    query: ListQuery,
) -> Result<Json<Vec<DirectoryEntry>>, ServerError> {
    info!("Called /ls for '{}' (verbose: {})", path, query.verbose);
    let entries = state.service.list(&path, query.verbose).await?;
    Ok(Json(entries))
}

pub async fn disk_usage(State(state): State<AppState>) -> Result<Json<DiskUsage>, ServerError> {
    info!("Called /disk_usage");
    Ok(Json(state.service.disk_usage().await?))
}

//! Route table
//!
//! `/health` is public; every other route sits behind the bearer-token check.
//! Unknown routes fall through to a plain 404 without authentication.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};

use crate::middleware::{log_requests, require_bearer};
use crate::protocol::handlers;
use crate::server::AppState;

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        // Upload bodies are bounded by the declared size, not the extractor default.
        .route(
            "/upload/",
            post(handlers::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/download/{*path}", get(handlers::download))
        .route("/delete/{*path}", delete(handlers::delete))
        .route("/ls/", get(handlers::list_root))
        .route("/ls/{*path}", get(handlers::list_path))
        .route("/disk_usage/", get(handlers::disk_usage))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

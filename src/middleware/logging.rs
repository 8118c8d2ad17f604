//! Logging middleware
//!
//! Provides request logging functionality.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Log method, path, status and elapsed time of every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = started.elapsed();
    if status.is_server_error() {
        warn!(
            "{} {} -> {} ({:.1?})",
            method,
            path,
            status.as_u16(),
            elapsed
        );
    } else {
        info!(
            "{} {} -> {} ({:.1?})",
            method,
            path,
            status.as_u16(),
            elapsed
        );
    }
    response
}

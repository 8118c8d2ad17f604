//! Bearer-token middleware
//!
//! Rejects requests without a valid `Authorization: Bearer <token>` header
//! before they reach a handler.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use log::debug;

use crate::auth::validate_bearer;
use crate::error::ServerError;
use crate::server::AppState;

/// Authenticated caller, available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    // A header that is not valid UTF-8 cannot carry a usable token.
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().unwrap_or_default()),
    };

    let username = validate_bearer(header, &state.tokens)?.to_string();
    debug!("Authenticated {} for {}", username, request.uri().path());
    request.extensions_mut().insert(AuthenticatedUser(username));

    Ok(next.run(request).await)
}

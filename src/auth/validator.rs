//! Authentication validator
//!
//! Checks `Authorization: Bearer <token>` headers against the token store.

use super::credentials::TokenStore;
use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Performs basic input sanitation on the presented token.
fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && !token.contains(char::is_whitespace) && !token.contains('\0')
}

/// Validates a raw `Authorization` header value; returns the token's owner.
pub fn validate_bearer<'a>(
    header: Option<&str>,
    store: &'a TokenStore,
) -> Result<&'a str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)?;

    if !is_valid_token(token) {
        return Err(AuthError::InvalidToken);
    }

    store.username_for(token).ok_or(AuthError::InvalidToken)
}

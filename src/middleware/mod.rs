//! Server middleware
//!
//! Provides authentication and request logging middleware.

pub mod auth;
pub mod logging;

pub use auth::{AuthenticatedUser, require_bearer};
pub use logging::log_requests;

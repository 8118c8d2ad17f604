//! Authentication system
//!
//! Handles bearer-token storage and validation.

pub mod credentials;
pub mod validator;

pub use credentials::{Credential, TokenStore};
pub use validator::validate_bearer;

//! HTTP protocol layer
//!
//! Request parsing, handlers and response bodies for the file API.

pub mod handlers;
pub mod parser;
pub mod responses;

pub use parser::{attachment_disposition, parse_archive_flag, parse_upload_path};
pub use responses::{HealthResponse, UploadResponse};

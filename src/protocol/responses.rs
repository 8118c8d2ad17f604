//! Response bodies
//!
//! JSON shapes returned by the HTTP handlers.

use serde::Serialize;

pub const HEALTH_OK_MESSAGE: &str = "Service is running";
pub const UPLOAD_OK_MESSAGE: &str = "Upload successful";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            message: HEALTH_OK_MESSAGE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_name: String,
    pub message: &'static str,
}

impl UploadResponse {
    pub fn new(file_name: String) -> Self {
        Self {
            file_name,
            message: UPLOAD_OK_MESSAGE,
        }
    }
}

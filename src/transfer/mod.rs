//! Transfer module
//!
//! Upload, download and delete pipelines built on the storage primitives,
//! all reached through [`FileService`].

pub mod delete;
pub mod download;
pub mod results;
pub mod service;
pub mod upload;

// Re-export key types
pub use download::TransientArchive;
pub use results::{Download, UploadOutcome};
pub use service::FileService;
pub use upload::{DeclaredSize, UploadRequest};

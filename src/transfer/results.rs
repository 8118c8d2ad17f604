//! Transfer result types
//!
//! Defines result structures returned by transfer operations.

use tokio::fs::File;

use crate::transfer::download::TransientArchive;

/// Result of a committed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub file_name: String,
    pub stored_path: String,
    /// An archive expansion was queued for this upload.
    pub expanding: bool,
}

/// A file ready to be streamed to the client
#[derive(Debug)]
pub struct Download {
    /// Opened before `size` was read; stream from this, not from the path.
    pub file: File,
    pub file_name: String,
    pub size: u64,
    /// Set when `file` is a freshly built archive; dropping it schedules removal.
    pub transient: Option<TransientArchive>,
}

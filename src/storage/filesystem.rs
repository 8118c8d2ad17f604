//! File system operations
//!
//! Small async helpers shared by the transfer pipelines.

use std::io::{ErrorKind, Result};
use std::path::Path;

/// What kind of object sits at a path, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    File,
    Directory,
    Other,
}

/// Inspect `path`; `None` if nothing is there.
pub async fn object_kind(path: &Path) -> Result<Option<ObjectKind>> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => {
            let file_type = metadata.file_type();
            let kind = if file_type.is_dir() {
                ObjectKind::Directory
            } else if file_type.is_file() {
                ObjectKind::File
            } else {
                ObjectKind::Other
            };
            Ok(Some(kind))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create a directory and its parents
pub async fn create_directory(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Remove a file, treating "already gone" as success.
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Remove a directory tree, treating "already gone" as success.
pub async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

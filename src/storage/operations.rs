//! Storage operations
//!
//! Read-only reports over the storage tree: directory listings and disk usage.

use log::info;
use std::io::ErrorKind;

use crate::error::StorageError;
use crate::storage::capacity;
use crate::storage::results::{DirectoryEntry, DiskUsage, EntryType};
use crate::storage::validation::PathSandbox;

/// Lists a directory (or describes a single file) under the storage root.
///
/// Entries come back sorted by name. Sizes are only filled in when `verbose`
/// is set; folders report 0.
pub async fn list_directory(
    sandbox: &PathSandbox,
    raw_path: &str,
    verbose: bool,
) -> Result<Vec<DirectoryEntry>, StorageError> {
    let real_path = sandbox.resolve_directory(raw_path)?;

    let metadata = match tokio::fs::metadata(&real_path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::NotFound(raw_path.to_string()));
        }
        Err(e) => return Err(StorageError::from(e)),
    };

    if !metadata.is_dir() {
        let name = real_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = verbose.then_some(metadata.len());
        return Ok(vec![DirectoryEntry::new(name, EntryType::File, size)]);
    }

    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(&real_path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            // Vanished between read_dir and stat.
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(StorageError::from(e)),
        };

        let (kind, size) = if metadata.is_dir() {
            (EntryType::Folder, 0)
        } else {
            (EntryType::File, metadata.len())
        };
        entries.push(DirectoryEntry::new(name, kind, verbose.then_some(size)));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        "Listed directory {} (real: {}) - {} entries",
        raw_path,
        real_path.display(),
        entries.len()
    );

    Ok(entries)
}

/// Reports total/used/free space of the storage volume.
pub async fn disk_usage(sandbox: &PathSandbox) -> Result<DiskUsage, StorageError> {
    let root = sandbox.root().to_path_buf();
    tokio::task::spawn_blocking(move || capacity::disk_usage(&root))
        .await
        .map_err(|e| StorageError::IoError(std::io::Error::other(e)))?
}

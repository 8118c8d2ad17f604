//! Free-space checks
//!
//! Upload preflight against the storage volume, keeping a reserved margin
//! that is never handed out.

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::results::DiskUsage;

/// 1 GiB
pub const DEFAULT_RESERVED_BYTES: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CapacityGuard {
    root: PathBuf,
    reserved: u64,
}

impl CapacityGuard {
    pub fn new(root: impl Into<PathBuf>, reserved: u64) -> Self {
        Self {
            root: root.into(),
            reserved,
        }
    }

    /// Bytes an upload may still claim.
    ///
    /// Space query failures come back as `IoError`, never as insufficient storage.
    pub fn available(&self) -> Result<u64, StorageError> {
        let free = fs2::available_space(&self.root)?;
        Ok(free.saturating_sub(self.reserved))
    }

    pub fn ensure(&self, required: u64) -> Result<(), StorageError> {
        let available = self.available()?;
        debug!(
            "Capacity check on {}: {} required, {} available",
            self.root.display(),
            required,
            available
        );
        if required > available {
            return Err(StorageError::InsufficientStorage {
                required,
                available,
            });
        }
        Ok(())
    }
}

/// Total, used and free space of the volume holding `root`.
pub fn disk_usage(root: &Path) -> Result<DiskUsage, StorageError> {
    let total = fs2::total_space(root)?;
    let free = fs2::available_space(root)?;
    Ok(DiskUsage::from_bytes(total, total.saturating_sub(free), free))
}

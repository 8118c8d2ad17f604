//! File service
//!
//! Owns the collaborators shared by every transfer: the path sandbox, the
//! capacity guard, the lock registry, the archiver and the background queue.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{ArchiveTool, TarArchiver};
use crate::config::ServerConfig;
use crate::error::StorageError;
use crate::storage::{
    CapacityGuard, DirectoryEntry, DiskUsage, LockRegistry, PathSandbox, filesystem, operations,
};
use crate::tasks::BackgroundTasks;

#[derive(Clone)]
pub struct FileService {
    pub(crate) sandbox: PathSandbox,
    pub(crate) capacity: CapacityGuard,
    pub(crate) locks: LockRegistry,
    pub(crate) archiver: Arc<dyn ArchiveTool>,
    pub(crate) tasks: BackgroundTasks,
    pub(crate) temp_root: PathBuf,
}

impl FileService {
    pub fn new(config: &ServerConfig) -> Self {
        let storage_root = config.storage_root_path();
        let temp_root = config.temp_root_path();
        Self {
            sandbox: PathSandbox::new(&storage_root, config.max_name_length),
            capacity: CapacityGuard::new(&storage_root, config.reserved_space_bytes()),
            locks: LockRegistry::new(),
            archiver: Arc::new(TarArchiver::new(&config.archive_program, &temp_root)),
            tasks: BackgroundTasks::new(),
            temp_root,
        }
    }

    /// Replace the archiver, e.g. with an in-process codec.
    pub fn with_archiver(mut self, archiver: Arc<dyn ArchiveTool>) -> Self {
        self.archiver = archiver;
        self
    }

    /// Create the storage and temp roots if missing.
    pub async fn prepare_directories(&self) -> std::io::Result<()> {
        filesystem::create_directory(self.sandbox.root()).await?;
        filesystem::create_directory(&self.temp_root).await
    }

    pub fn storage_root(&self) -> &Path {
        self.sandbox.root()
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub async fn list(
        &self,
        raw_path: &str,
        verbose: bool,
    ) -> Result<Vec<DirectoryEntry>, StorageError> {
        operations::list_directory(&self.sandbox, raw_path, verbose).await
    }

    pub async fn disk_usage(&self) -> Result<DiskUsage, StorageError> {
        operations::disk_usage(&self.sandbox).await
    }
}

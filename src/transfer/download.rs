//! Module `download`
//!
//! Locates files for download, packing directories into a transient archive
//! on the fly. The archive is removed by a background task once the guard
//! that owns it is dropped, which the HTTP layer ties to the end of the
//! response stream.

use log::{info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;

use crate::error::{ServerError, StorageError};
use crate::storage::filesystem;
use crate::tasks::BackgroundTasks;
use crate::transfer::FileService;
use crate::transfer::results::Download;

impl FileService {
    pub async fn download(&self, raw_path: &str) -> Result<Download, ServerError> {
        // Validating
        let stored = self.sandbox.resolve(raw_path)?;

        // Locating: size and bytes both come from this one handle, so a
        // concurrent replace can't make them disagree.
        let file = match File::open(stored.absolute()).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(stored.relative().to_string()).into());
            }
            Err(e) => return Err(StorageError::from(e).into()),
        };
        let metadata = file.metadata().await.map_err(StorageError::from)?;

        if !metadata.is_dir() {
            info!(
                "Prepared download of {} ({} bytes)",
                stored.relative(),
                metadata.len()
            );
            return Ok(Download {
                file,
                file_name: stored.name().to_string(),
                size: metadata.len(),
                transient: None,
            });
        }
        drop(file);

        // Archiving
        let archive = self.archiver.compress(stored.absolute()).await?;
        let transient = TransientArchive::new(archive, &self.temp_root, self.tasks.clone());
        // On error `transient` drops here and schedules its own cleanup.
        let file = File::open(transient.path())
            .await
            .map_err(StorageError::from)?;
        let size = file.metadata().await.map_err(StorageError::from)?.len();
        let file_name = transient
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(
            "Prepared archive download of {} as {} ({} bytes)",
            stored.relative(),
            file_name,
            size
        );

        Ok(Download {
            file,
            file_name,
            size,
            transient: Some(transient),
        })
    }
}

/// An archive built for a single response.
///
/// Dropping it queues removal of the file and of its private build directory.
#[derive(Debug)]
pub struct TransientArchive {
    path: PathBuf,
    build_dir: Option<PathBuf>,
    tasks: BackgroundTasks,
}

impl TransientArchive {
    pub fn new(path: PathBuf, scratch_root: &Path, tasks: BackgroundTasks) -> Self {
        // Only a per-build subdirectory is ours to remove, never the scratch root.
        let build_dir = path
            .parent()
            .filter(|parent| *parent != scratch_root && parent.starts_with(scratch_root))
            .map(Path::to_path_buf);
        Self {
            path,
            build_dir,
            tasks,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientArchive {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        let build_dir = self.build_dir.take();

        if tokio::runtime::Handle::try_current().is_ok() {
            self.tasks
                .submit(format!("cleanup {}", path.display()), async move {
                    remove_transient(&path, build_dir.as_deref()).await;
                    Ok(())
                });
            return;
        }

        // No runtime left (shutdown); clean up inline.
        if let Err(e) = std::fs::remove_file(&path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!("Failed to remove transient archive {}: {}", path.display(), e);
        }
        if let Some(dir) = build_dir {
            let _ = std::fs::remove_dir(dir);
        }
    }
}

/// Failures are logged only; a stray archive is not a data problem.
async fn remove_transient(path: &Path, build_dir: Option<&Path>) {
    if let Err(e) = filesystem::remove_file_if_exists(path).await {
        warn!("Failed to remove transient archive {}: {}", path.display(), e);
        return;
    }
    if let Some(dir) = build_dir
        && let Err(e) = tokio::fs::remove_dir(dir).await
        && e.kind() != ErrorKind::NotFound
    {
        warn!("Failed to remove archive directory {}: {}", dir.display(), e);
    }
    info!("Removed transient archive {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn service() -> (TempDir, FileService) {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            storage_root: dir.path().join("storage").to_string_lossy().into_owned(),
            temp_root: dir.path().join("tmp").to_string_lossy().into_owned(),
            reserved_space_mb: 0,
            ..ServerConfig::default()
        };
        let service = FileService::new(&config);
        std::fs::create_dir_all(service.storage_root()).unwrap();
        std::fs::create_dir_all(service.temp_root()).unwrap();
        (dir, service)
    }

    #[tokio::test]
    async fn plain_file_is_served_in_place() {
        let (_dir, service) = service();
        std::fs::write(service.storage_root().join("a.txt"), b"hello").unwrap();

        let download = service.download("a.txt").await.unwrap();
        assert_eq!(download.file_name, "a.txt");
        assert_eq!(download.size, 5);
        assert!(download.transient.is_none());
    }

    #[tokio::test]
    async fn replacement_after_lookup_does_not_change_the_body() {
        let (_dir, service) = service();
        let path = service.storage_root().join("report.txt");
        std::fs::write(&path, b"original").unwrap();

        let mut download = service.download("report.txt").await.unwrap();

        // A forced upload commits by rename over the old file.
        let replacement = service.storage_root().join(".report.next");
        std::fs::write(&replacement, b"replacement, and longer").unwrap();
        std::fs::rename(&replacement, &path).unwrap();

        let mut served = Vec::new();
        download.file.read_to_end(&mut served).await.unwrap();
        assert_eq!(served, b"original");
        assert_eq!(served.len() as u64, download.size);
    }

    #[tokio::test]
    async fn missing_and_invalid_targets() {
        let (_dir, service) = service();
        assert!(matches!(
            service.download("nope.txt").await,
            Err(ServerError::Storage(StorageError::NotFound(_)))
        ));
        assert!(matches!(
            service.download("../etc/passwd").await,
            Err(ServerError::Storage(StorageError::InvalidPath(_)))
        ));
    }

    #[tokio::test]
    async fn directory_is_archived_and_cleaned_up_after_drop() {
        let (_dir, service) = service();
        let backup = service.storage_root().join("backup");
        std::fs::create_dir_all(&backup).unwrap();
        std::fs::write(backup.join("one.txt"), b"1").unwrap();

        let download = service.download("backup").await.unwrap();
        assert_eq!(download.file_name, ".backup.tar.gz");
        let archive = download.transient.as_ref().unwrap().path().to_path_buf();
        assert!(archive.starts_with(service.temp_root()));
        assert!(archive.exists());
        assert!(download.size > 0);

        drop(download);
        service.tasks().wait_idle().await;

        assert!(!archive.exists());
        assert_eq!(std::fs::read_dir(service.temp_root()).unwrap().count(), 0);
    }

    #[test]
    fn transient_archive_never_claims_the_scratch_root() {
        let tasks = BackgroundTasks::new();
        let scratch = Path::new("/srv/tmp");
        let nested = TransientArchive::new(scratch.join("id/.x.tar.gz"), scratch, tasks.clone());
        assert_eq!(nested.build_dir.as_deref(), Some(scratch.join("id").as_path()));
        let flat = TransientArchive::new(scratch.join(".x.tar.gz"), scratch, tasks);
        assert!(flat.build_dir.is_none());
        // Both dropped outside a runtime: inline removal of non-existent files is harmless.
    }
}

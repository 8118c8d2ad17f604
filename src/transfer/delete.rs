//! Module `delete`
//!
//! Removal is checked up front and carried out in the background under the
//! path lock, so it waits for any upload or expansion still holding it.

use log::{info, warn};
use std::path::PathBuf;

use crate::error::{ServerError, StorageError};
use crate::storage::filesystem::{self, ObjectKind};
use crate::transfer::FileService;

impl FileService {
    pub async fn delete(&self, raw_path: &str) -> Result<(), ServerError> {
        let stored = self.sandbox.resolve(raw_path)?;
        if filesystem::object_kind(stored.absolute())
            .await
            .map_err(StorageError::from)?
            .is_none()
        {
            return Err(StorageError::NotFound(stored.relative().to_string()).into());
        }

        info!("Delete scheduled for {}", stored.relative());

        let key = stored.relative().to_string();
        let target = stored.absolute().to_path_buf();
        let locks = self.locks.clone();
        self.tasks.submit(format!("delete {}", key), async move {
            let _lock = locks.acquire(&key).await;
            remove_object(&key, target).await
        });
        Ok(())
    }
}

async fn remove_object(key: &str, target: PathBuf) -> Result<(), ServerError> {
    // Re-inspect: the object may have changed while we waited for the lock.
    match filesystem::object_kind(&target).await.map_err(StorageError::from)? {
        Some(ObjectKind::Directory) => {
            filesystem::remove_dir_if_exists(&target)
                .await
                .map_err(StorageError::from)?;
            info!("Deleted directory {}", key);
        }
        Some(ObjectKind::File) => {
            filesystem::remove_file_if_exists(&target)
                .await
                .map_err(StorageError::from)?;
            info!("Deleted file {}", key);
        }
        Some(ObjectKind::Other) => {
            warn!("Refusing to delete {}: not a regular file or directory", key);
        }
        None => info!("{} was already gone", key),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::time::Duration;
    use tempfile::TempDir;

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
        (dir, service)
    }

    #[tokio::test]
    async fn removes_files_and_trees() {
        let (_dir, service) = service();
        let root = service.storage_root().to_path_buf();
        std::fs::write(root.join("a.txt"), b"a").unwrap();
        std::fs::create_dir_all(root.join("tree/deep")).unwrap();
        std::fs::write(root.join("tree/deep/b.txt"), b"b").unwrap();

        service.delete("a.txt").await.unwrap();
        service.delete("tree").await.unwrap();
        service.tasks().wait_idle().await;

        assert!(!root.join("a.txt").exists());
        assert!(!root.join("tree").exists());
        assert!(service.locks().is_empty());
    }

    #[tokio::test]
    async fn missing_and_invalid_targets_fail_immediately() {
        let (_dir, service) = service();
        assert!(matches!(
            service.delete("ghost.txt").await,
            Err(ServerError::Storage(StorageError::NotFound(_)))
        ));
        assert!(matches!(
            service.delete("../outside").await,
            Err(ServerError::Storage(StorageError::InvalidPath(_)))
        ));
        assert_eq!(service.tasks().pending(), 0);
    }

    #[tokio::test]
    async fn waits_for_the_path_lock() {
        let (_dir, service) = service();
        let file = service.storage_root().join("busy.txt");
        std::fs::write(&file, b"x").unwrap();

        let held = service.locks().try_acquire("busy.txt").unwrap();
        service.delete("busy.txt").await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(file.exists());

        drop(held);
        service.tasks().wait_idle().await;
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn leaves_symlinks_alone() {
        let (_dir, service) = service();
        let target = service.storage_root().join("target.txt");
        std::fs::write(&target, b"keep").unwrap();
        let link = service.storage_root().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        service.delete("link").await.unwrap();
        service.tasks().wait_idle().await;

        assert!(std::fs::symlink_metadata(&link).is_ok());
        assert!(target.exists());
    }
}

//! Module `upload`
//!
//! Validates, stages and atomically commits uploads. The body is written
//! chunk by chunk into a private staging directory under the temp root and
//! renamed into the storage tree only once complete, so readers see either
//! nothing or the whole file.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use std::error::Error as StdError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::archive::archive_file_name;
use crate::error::{RequestError, ServerError, StorageError};
use crate::storage::filesystem::{self, ObjectKind};
use crate::storage::{PathLockGuard, StoredPath};
use crate::transfer::FileService;
use crate::transfer::results::UploadOutcome;

/// The size a client announced for its upload body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredSize {
    Missing,
    Invalid(String),
    Bytes(u64),
}

impl DeclaredSize {
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None => DeclaredSize::Missing,
            Some(raw) => match raw.parse::<u64>() {
                Ok(bytes) => DeclaredSize::Bytes(bytes),
                Err(_) => DeclaredSize::Invalid(raw.to_string()),
            },
        }
    }
}

/// Everything the pipeline needs besides the body itself.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: String,
    pub declared_size: DeclaredSize,
    pub is_archive: bool,
    pub force: bool,
}

impl FileService {
    /// Runs an upload through validation, conflict, capacity and lock checks,
    /// stages the body and commits it. Archive uploads queue their expansion
    /// and keep the path locked until it finishes.
    pub async fn upload<S, E>(
        &self,
        request: UploadRequest,
        body: S,
    ) -> Result<UploadOutcome, ServerError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        // Validating
        let stored = self.sandbox.resolve(&request.path)?;
        info!(
            "Upload requested for {} (archive: {}, force: {})",
            stored.relative(),
            request.is_archive,
            request.force
        );

        // CheckingConflict
        check_conflict(&stored, &request).await?;

        // CheckingCapacity
        let declared = match &request.declared_size {
            DeclaredSize::Missing => return Err(RequestError::LengthRequired.into()),
            DeclaredSize::Invalid(raw) => {
                return Err(RequestError::InvalidInput(format!(
                    "X-File-Size must be a byte count, got '{}'",
                    raw
                ))
                .into());
            }
            DeclaredSize::Bytes(bytes) => *bytes,
        };
        self.capacity.ensure(declared)?;

        // AcquiringLock
        let lock = self
            .locks
            .try_acquire(stored.relative())
            .ok_or_else(|| StorageError::Locked(stored.relative().to_string()))?;
        // Another transaction may have finished between the first check and the lock.
        check_conflict(&stored, &request).await?;

        // Staging
        let staged_name = if request.is_archive {
            archive_file_name(stored.name())
        } else {
            stored.name().to_string()
        };
        let staged = StagedUpload::create(&self.temp_root, &staged_name).await?;
        let written = staged.write_body(body, declared).await?;
        if written != declared {
            debug!(
                "Upload {} declared {} bytes but sent {}",
                stored.relative(),
                declared,
                written
            );
        }

        if request.is_archive {
            // Expanding: the archive never enters the storage tree; it is
            // unpacked straight from staging into the target directory.
            let existing = filesystem::object_kind(stored.absolute()).await?;
            let replaces = request.force && existing == Some(ObjectKind::Directory);
            info!(
                "Archive staged for {} ({} bytes), expansion queued",
                stored.relative(),
                written
            );
            self.schedule_expansion(staged, stored.absolute().to_path_buf(), replaces, lock);
        } else {
            // Committing
            staged.commit(stored.absolute()).await?;
            info!(
                "Upload committed: {} ({} bytes)",
                stored.absolute().display(),
                written
            );
        }

        Ok(UploadOutcome {
            file_name: stored.name().to_string(),
            stored_path: stored.relative().to_string(),
            expanding: request.is_archive,
        })
    }

    /// Expansion runs after the response; the path stays locked until it is done.
    /// A forced upload over an existing tree removes that tree first.
    fn schedule_expansion(
        &self,
        staged: StagedUpload,
        target: PathBuf,
        replaces: bool,
        lock: PathLockGuard,
    ) {
        let archiver = self.archiver.clone();
        self.tasks.submit(format!("expand {}", lock.key()), async move {
            let _lock = lock;
            if replaces {
                filesystem::remove_dir_if_exists(&target)
                    .await
                    .map_err(StorageError::from)?;
                info!("Removed previous tree {} before expansion", target.display());
            }
            let expanded = archiver.expand(&staged.file, &target).await;
            staged.discard().await;
            expanded?;
            Ok(())
        });
    }
}

async fn check_conflict(stored: &StoredPath, request: &UploadRequest) -> Result<(), StorageError> {
    let Some(kind) = filesystem::object_kind(stored.absolute()).await? else {
        return Ok(());
    };
    if !request.force {
        return Err(StorageError::Conflict(stored.relative().to_string()));
    }
    // Overwrite replaces like with like: files with files, trees with trees.
    let replaceable = match kind {
        ObjectKind::Directory => request.is_archive,
        ObjectKind::File => !request.is_archive,
        ObjectKind::Other => false,
    };
    if !replaceable {
        return Err(StorageError::Conflict(format!(
            "{} exists with a different type",
            stored.relative()
        )));
    }
    Ok(())
}

/// A body being written under the temp root. Dropping it before
/// [`StagedUpload::commit`] or [`StagedUpload::discard`] (error, cancelled
/// request, client disconnect) removes the staging directory with whatever
/// was written.
struct StagedUpload {
    dir: PathBuf,
    file: PathBuf,
    settled: bool,
}

impl StagedUpload {
    async fn create(temp_root: &Path, name: &str) -> Result<Self, StorageError> {
        let dir = temp_root.join(format!(".staging-{}", Uuid::new_v4()));
        filesystem::create_directory(&dir).await?;
        Ok(Self {
            file: dir.join(name),
            dir,
            settled: false,
        })
    }

    /// Stream the body to disk. Refuses to write past `limit` bytes so the
    /// capacity check can't be bypassed by under-declaring.
    async fn write_body<S, E>(&self, body: S, limit: u64) -> Result<u64, ServerError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let mut body = std::pin::pin!(body);
        let mut file = File::create(&self.file).await?;
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ServerError::IoError(std::io::Error::other(e)))?;
            if chunk.is_empty() {
                continue;
            }
            written += chunk.len() as u64;
            if written > limit {
                return Err(RequestError::InvalidInput(format!(
                    "body exceeds declared X-File-Size of {} bytes",
                    limit
                ))
                .into());
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }

    /// Move the staged file onto `destination` in one rename.
    async fn commit(mut self, destination: &Path) -> Result<(), StorageError> {
        let parent = destination
            .parent()
            .ok_or_else(|| StorageError::IoError(ErrorKind::InvalidInput.into()))?;
        filesystem::create_directory(parent).await?;

        match tokio::fs::rename(&self.file, destination).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                // Copy next to the destination first so the visible step is still a rename.
                let side = parent.join(format!(
                    ".{}.{}.partial",
                    file_label(destination),
                    Uuid::new_v4()
                ));
                if let Err(e) = tokio::fs::copy(&self.file, &side).await {
                    let _ = filesystem::remove_file_if_exists(&side).await;
                    return Err(e.into());
                }
                if let Err(e) = tokio::fs::rename(&side, destination).await {
                    let _ = filesystem::remove_file_if_exists(&side).await;
                    return Err(e.into());
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.discard().await;
        Ok(())
    }

    /// Remove the staging directory once its content has been consumed.
    async fn discard(mut self) {
        self.settled = true;
        if let Err(e) = filesystem::remove_dir_if_exists(&self.dir).await {
            warn!(
                "Failed to remove staging directory {}: {}",
                self.dir.display(),
                e
            );
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Runs on cancellation, where nothing can be awaited. The directory
        // holds a single file, so this is two unlinks rather than a tree walk.
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!("Discarded staged upload {}", self.file.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to discard staged upload {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}

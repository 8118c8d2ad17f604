//! Module `tar`
//!
//! [`ArchiveTool`] backed by the external `tar` program. Exit status and
//! captured stderr are the only error signal taken from the tool.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

use crate::archive::{ArchiveTool, archive_file_name};
use crate::error::ArchiveError;
use crate::storage::filesystem;

#[derive(Debug, Clone)]
pub struct TarArchiver {
    program: String,
    scratch_root: PathBuf,
}

impl TarArchiver {
    /// `scratch_root` receives the archives built by [`ArchiveTool::compress`].
    pub fn new(program: impl Into<String>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            scratch_root: scratch_root.into(),
        }
    }

    async fn run<I, S>(&self, args: I) -> Result<(), ArchiveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ArchiveError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ArchiveError::ToolFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveTool for TarArchiver {
    async fn compress(&self, directory: &Path) -> Result<PathBuf, ArchiveError> {
        let dir_name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());

        // One subdirectory per build so concurrent downloads of the same
        // directory never share an output file.
        let build_dir =
            BuildDir::create(self.scratch_root.join(Uuid::new_v4().to_string())).await?;
        let archive = build_dir.path.join(archive_file_name(&dir_name));

        self.run([
            OsStr::new("--no-xattrs"),
            OsStr::new("-czf"),
            archive.as_os_str(),
            OsStr::new("-C"),
            directory.as_os_str(),
            OsStr::new("."),
        ])
        .await?;

        build_dir.keep();
        info!(
            "Compressed {} into {}",
            directory.display(),
            archive.display()
        );
        Ok(archive)
    }

    async fn expand(&self, archive: &Path, target: &Path) -> Result<(), ArchiveError> {
        filesystem::create_directory(target).await?;

        self.run([
            OsStr::new("--no-same-owner"),
            OsStr::new("-xf"),
            archive.as_os_str(),
            OsStr::new("-C"),
            target.as_os_str(),
        ])
        .await?;

        info!("Expanded {} into {}", archive.display(), target.display());

        // The data is already in place; a stray archive is only an annoyance.
        if let Err(e) = filesystem::remove_file_if_exists(archive).await {
            warn!(
                "Expanded archive {} could not be removed: {}",
                archive.display(),
                e
            );
        }

        Ok(())
    }
}

/// Per-build output directory. Removed on drop unless the build succeeded,
/// which covers tool failures as well as a caller dropping `compress`
/// mid-run (the child is killed by `kill_on_drop`).
struct BuildDir {
    path: PathBuf,
    kept: bool,
}

impl BuildDir {
    async fn create(path: PathBuf) -> Result<Self, ArchiveError> {
        filesystem::create_directory(&path).await?;
        Ok(Self { path, kept: false })
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for BuildDir {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed unfinished archive build {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove partial archive {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                    files.insert(rel, std::fs::read(&path).unwrap());
                }
            }
        }
        files
    }

    #[tokio::test]
    async fn compress_then_expand_reproduces_tree() {
        let storage = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let source = storage.path().join("backup");
        std::fs::create_dir_all(source.join("nested")).unwrap();
        std::fs::write(source.join("a.txt"), b"alpha").unwrap();
        std::fs::write(source.join("nested/b.bin"), [0u8, 1, 2, 255]).unwrap();

        let archiver = TarArchiver::new("tar", scratch.path());
        let archive = archiver.compress(&source).await.unwrap();
        assert!(archive.starts_with(scratch.path()));
        assert_eq!(archive.file_name().unwrap(), ".backup.tar.gz");

        // Move the archive somewhere else and expand it there.
        let restore = TempDir::new().unwrap();
        let moved = restore.path().join(".backup.tar.gz");
        std::fs::copy(&archive, &moved).unwrap();

        let target = restore.path().join("restored");
        archiver.expand(&moved, &target).await.unwrap();
        assert!(!moved.exists());
        assert_eq!(read_tree(&target), read_tree(&source));
    }

    #[tokio::test]
    async fn tool_failure_reports_stderr() {
        let scratch = TempDir::new().unwrap();
        let archiver = TarArchiver::new("tar", scratch.path());
        let bogus = scratch.path().join(".broken.tar.gz");
        std::fs::write(&bogus, b"definitely not gzip").unwrap();

        match archiver.expand(&bogus, &scratch.path().join("broken")).await {
            Err(ArchiveError::ToolFailed { stderr, .. }) => assert!(!stderr.trim().is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
        // Failed extraction leaves the archive for inspection.
        assert!(bogus.exists());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let scratch = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let archiver = TarArchiver::new("rax-no-such-archiver", scratch.path());
        assert!(matches!(
            archiver.compress(source.path()).await,
            Err(ArchiveError::Spawn { .. })
        ));
        // The per-build directory is cleaned up.
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn abandoned_compress_leaves_no_build_dir() {
        use std::os::unix::fs::PermissionsExt;

        let tools = TempDir::new().unwrap();
        let slow = tools.path().join("slow-tar");
        std::fs::write(&slow, "#!/bin/sh\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&slow, std::fs::Permissions::from_mode(0o755)).unwrap();

        let scratch = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let archiver = TarArchiver::new(slow.to_string_lossy(), scratch.path());

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            archiver.compress(source.path()),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}

//! Directory archiving
//!
//! Packs directories into single files for download and unpacks uploaded
//! archives into directories. Pipelines only see the [`ArchiveTool`] trait, so
//! the subprocess-backed [`TarArchiver`] can be swapped for an in-process codec.

pub mod tar;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::ArchiveError;

pub use self::tar::TarArchiver;

#[async_trait]
pub trait ArchiveTool: Send + Sync {
    /// Pack the contents of `directory` into a new transient archive and
    /// return its path. Entries are stored relative to `directory`.
    async fn compress(&self, directory: &Path) -> Result<PathBuf, ArchiveError>;

    /// Unpack `archive` into `target` (created if missing), then remove the
    /// archive. Not safe to blindly retry: a failed extraction may have
    /// written part of the tree.
    async fn expand(&self, archive: &Path, target: &Path) -> Result<(), ArchiveError>;
}

/// Name under which an archive of `name` is built: `.{name}.tar.gz`.
pub fn archive_file_name(name: &str) -> String {
    format!(".{name}.tar.gz")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_names_are_hidden_tarballs() {
        assert_eq!(archive_file_name("backup"), ".backup.tar.gz");
        assert_eq!(archive_file_name("my site"), ".my site.tar.gz");
    }
}

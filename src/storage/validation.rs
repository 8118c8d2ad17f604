//! Path validation
//!
//! Resolves client-supplied relative paths against the storage root and
//! refuses anything that could land outside it or produce an unsafe name.

use std::path::{Component, Path, PathBuf};

use crate::error::PathRejection;

/// Characters refused in a stored name even when the allow-list would pass them.
pub const RESERVED_CHARACTERS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A client path that passed the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPath {
    relative: String,
    absolute: PathBuf,
    name: String,
}

impl StoredPath {
    /// Normalized relative form, components joined by `/`. Used as the lock key.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Resolved location under the storage root.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Final name component.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validates paths against a fixed storage root.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
    max_name_length: usize,
}

impl PathSandbox {
    pub fn new(root: impl Into<PathBuf>, max_name_length: usize) -> Self {
        Self {
            root: root.into(),
            max_name_length,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `raw` under the storage root.
    ///
    /// Rules are applied in order and each failure carries its own
    /// [`PathRejection`]. Nothing on disk is created or modified.
    pub fn resolve(&self, raw: &str) -> Result<StoredPath, PathRejection> {
        if raw.trim().is_empty() {
            return Err(PathRejection::Empty);
        }

        if raw.starts_with('/') || raw.starts_with('\\') || Path::new(raw).is_absolute() {
            return Err(PathRejection::Absolute);
        }

        let components = normalize(raw)?;
        let absolute = components
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part));
        if !self.stays_inside_root(&absolute) {
            return Err(PathRejection::OutsideRoot);
        }

        let name = match components.last() {
            Some(name) if !raw.ends_with('/') && !raw.ends_with('\\') => name.clone(),
            _ => return Err(PathRejection::EmptyName),
        };

        if !name.chars().all(is_allowed_name_char) {
            return Err(PathRejection::InvalidCharacters);
        }

        if let Some(c) = name.chars().find(|c| RESERVED_CHARACTERS.contains(c)) {
            return Err(PathRejection::ReservedCharacter(c));
        }

        let length = name.chars().count();
        if length > self.max_name_length {
            return Err(PathRejection::NameTooLong {
                length,
                max: self.max_name_length,
            });
        }

        Ok(StoredPath {
            relative: components.join("/"),
            absolute,
            name,
        })
    }

    /// Resolve a directory for listing; blank input means the root itself.
    pub fn resolve_directory(&self, raw: &str) -> Result<PathBuf, PathRejection> {
        if raw.trim().is_empty() || raw.trim_matches('/').is_empty() {
            return Ok(self.root.clone());
        }
        self.resolve(raw.trim_end_matches('/'))
            .map(|stored| stored.absolute)
    }

    /// Symlink check: the deepest existing ancestor must canonicalize inside the root.
    fn stays_inside_root(&self, candidate: &Path) -> bool {
        let Ok(root) = self.root.canonicalize() else {
            // Root not created yet; nothing beneath it can be a link.
            return true;
        };

        let mut cursor = Some(candidate);
        while let Some(path) = cursor {
            if let Ok(resolved) = path.canonicalize() {
                return resolved.starts_with(&root);
            }
            cursor = path.parent();
        }
        false
    }
}

/// Lexically resolve `.` and `..`, refusing to climb above the root.
fn normalize(raw: &str) -> Result<Vec<String>, PathRejection> {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(PathRejection::OutsideRoot);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(PathRejection::Absolute),
        }
    }
    Ok(parts)
}

/// Letters, digits, `_`, `-`, `.` and whitespace.
fn is_allowed_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, PathSandbox) {
        let dir = TempDir::new().unwrap();
        let sandbox = PathSandbox::new(dir.path(), 32);
        (dir, sandbox)
    }

    #[test]
    fn resolves_nested_path() {
        let (dir, sandbox) = sandbox();
        let stored = sandbox.resolve("notes/todo.txt").unwrap();
        assert_eq!(stored.relative(), "notes/todo.txt");
        assert_eq!(stored.name(), "todo.txt");
        assert_eq!(stored.absolute(), dir.path().join("notes").join("todo.txt"));
    }

    #[test]
    fn normalizes_dot_segments_that_stay_inside() {
        let (_dir, sandbox) = sandbox();
        let stored = sandbox.resolve("a/./b/../c.txt").unwrap();
        assert_eq!(stored.relative(), "a/c.txt");
    }

    #[test]
    fn rejects_blank() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve(""), Err(PathRejection::Empty));
        assert_eq!(sandbox.resolve("   "), Err(PathRejection::Empty));
    }

    #[test]
    fn rejects_absolute() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve("/etc/passwd"), Err(PathRejection::Absolute));
        assert_eq!(sandbox.resolve("\\share"), Err(PathRejection::Absolute));
    }

    #[test]
    fn rejects_traversal() {
        let (dir, sandbox) = sandbox();
        for raw in ["../secret", "a/../../secret", "..", "a/b/../../../x"] {
            assert_eq!(sandbox.resolve(raw), Err(PathRejection::OutsideRoot), "{raw}");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escape() {
        let (dir, sandbox) = sandbox();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        assert_eq!(
            sandbox.resolve("link/file.txt"),
            Err(PathRejection::OutsideRoot)
        );
    }

    #[test]
    fn rejects_empty_name() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve("notes/"), Err(PathRejection::EmptyName));
        assert_eq!(sandbox.resolve("notes/.."), Err(PathRejection::EmptyName));
    }

    #[test]
    fn rejects_names_outside_allow_list() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(
            sandbox.resolve("notes/semi;colon"),
            Err(PathRejection::InvalidCharacters)
        );
        assert_eq!(
            sandbox.resolve("what?.txt"),
            Err(PathRejection::InvalidCharacters)
        );
    }

    #[test]
    fn accepts_spaces_and_unicode_letters() {
        let (_dir, sandbox) = sandbox();
        assert!(sandbox.resolve("my notes/Résumé final.pdf").is_ok());
    }

    #[test]
    fn rejects_long_names() {
        let (_dir, sandbox) = sandbox();
        let name = "a".repeat(33);
        assert_eq!(
            sandbox.resolve(&name),
            Err(PathRejection::NameTooLong {
                length: 33,
                max: 32
            })
        );
        assert!(sandbox.resolve(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn directory_resolution_accepts_root() {
        let (dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve_directory("").unwrap(), dir.path());
        assert_eq!(sandbox.resolve_directory("/").unwrap(), dir.path());
        assert_eq!(
            sandbox.resolve_directory("notes/").unwrap(),
            dir.path().join("notes")
        );
    }
}

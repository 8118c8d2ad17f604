//! File system storage management
//!
//! Handles path validation, capacity checks, per-path locking and the
//! read-only storage reports.

pub mod capacity;
pub mod filesystem;
pub mod locks;
pub mod operations;
pub mod results;
pub mod validation;

// Re-export commonly used types
pub use capacity::CapacityGuard;
pub use locks::{LockRegistry, PathLockGuard};
pub use results::{DirectoryEntry, DiskUsage, EntryType};
pub use validation::{PathSandbox, StoredPath};

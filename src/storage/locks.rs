//! Module `locks`
//!
//! Per-path mutual exclusion for uploads and deletes. Each normalized path
//! maps to one async mutex that lives only while somebody references it:
//! handles count themselves in on checkout and out on drop, and the entry is
//! evicted when the count reaches zero.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct LockEntry {
    lock: Arc<AsyncMutex<()>>,
    refs: usize,
}

type Entries = Arc<Mutex<HashMap<String, LockEntry>>>;

/// Registry mapping normalized paths to their locks.
#[derive(Clone, Default)]
pub struct LockRegistry {
    entries: Entries,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the lock for `key` is free and take it.
    ///
    /// Dropping the returned future while it waits releases its reference.
    pub async fn acquire(&self, key: &str) -> PathLockGuard {
        let handle = self.checkout(key);
        let guard = Arc::clone(&handle.lock).lock_owned().await;
        PathLockGuard {
            _guard: guard,
            handle,
        }
    }

    /// Take the lock for `key` only if nobody holds it right now.
    pub fn try_acquire(&self, key: &str) -> Option<PathLockGuard> {
        let handle = self.checkout(key);
        match Arc::clone(&handle.lock).try_lock_owned() {
            Ok(guard) => Some(PathLockGuard {
                _guard: guard,
                handle,
            }),
            Err(_) => None,
        }
    }

    /// Whether a transaction currently holds the lock for `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        lock_entries(&self.entries)
            .get(key)
            .is_some_and(|entry| entry.lock.try_lock().is_err())
    }

    /// Number of paths with live references.
    pub fn len(&self) -> usize {
        lock_entries(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn checkout(&self, key: &str) -> LockHandle {
        let mut entries = lock_entries(&self.entries);
        let entry = entries.entry(key.to_string()).or_insert_with(|| LockEntry {
            lock: Arc::new(AsyncMutex::new(())),
            refs: 0,
        });
        entry.refs += 1;
        LockHandle {
            entries: Arc::clone(&self.entries),
            key: key.to_string(),
            lock: Arc::clone(&entry.lock),
        }
    }
}

/// The map is only touched in short critical sections that cannot leave it
/// half-updated, so a poisoned guard is still usable.
fn lock_entries(entries: &Entries) -> MutexGuard<'_, HashMap<String, LockEntry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One counted reference to a registry entry.
struct LockHandle {
    entries: Entries,
    key: String,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let mut entries = lock_entries(&self.entries);
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.refs -= 1;
            if entry.refs == 0 {
                entries.remove(&self.key);
            }
        }
    }
}

/// Exclusive hold on one path. Released on drop.
pub struct PathLockGuard {
    // Declared first so the mutex is released before the reference is returned.
    _guard: OwnedMutexGuard<()>,
    handle: LockHandle,
}

impl PathLockGuard {
    pub fn key(&self) -> &str {
        &self.handle.key
    }
}

impl std::fmt::Debug for PathLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathLockGuard")
            .field("key", &self.handle.key)
            .finish()
    }
}

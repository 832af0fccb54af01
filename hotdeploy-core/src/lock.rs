//! Per-path mutual exclusion for copy and rewrite

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async locks keyed by destination path.
///
/// Requests for the same destination file are serialized; unrelated paths
/// never contend. A slot is dropped from the map once nobody holds or
/// waits on it.
#[derive(Debug, Default)]
pub struct PathLocks {
    slots: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`.
    ///
    /// Cancelling the returned future while it waits gives up the slot like
    /// a released guard does.
    pub async fn lock(&self, path: &Path) -> PathGuard<'_> {
        let slot = SlotHandle::claim(self, path);
        let guard = slot.acquire().await;

        PathGuard {
            _guard: guard,
            _slot: slot,
        }
    }

    /// Number of paths currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Exclusive access to one path; released on drop.
#[derive(Debug)]
pub struct PathGuard<'a> {
    // Field order matters: the mutex is released before the slot is given up
    _guard: OwnedMutexGuard<()>,
    _slot: SlotHandle<'a>,
}

/// A registered interest in one path's slot.
#[derive(Debug)]
struct SlotHandle<'a> {
    locks: &'a PathLocks,
    path: PathBuf,
    slot: Arc<AsyncMutex<()>>,
}

impl<'a> SlotHandle<'a> {
    fn claim(locks: &'a PathLocks, path: &Path) -> Self {
        let slot = locks
            .slots
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .clone();

        Self {
            locks,
            path: path.to_path_buf(),
            slot,
        }
    }

    async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.slot).lock_owned().await
    }
}

impl Drop for SlotHandle<'_> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots.lock();
        // Handles let go of their slot only under the table lock, and mutex
        // guards or pending acquires are gone before their handle, so a lone
        // map reference means nobody else holds or awaits the path.
        drop(std::mem::take(&mut self.slot));
        if slots
            .get(&self.path)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.path);
        }
    }
}

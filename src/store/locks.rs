//! Write serialization for folders and the folder tree.
//!
//! Two levels:
//!
//! - a tree lock. Operations that relocate or remove whole subtrees
//!   (`delete_folder`, `rename_folder`, `move_folder`) take it exclusively.
//!   Every other mutation takes it shared, so a path resolved under the
//!   shared lock stays valid until the operation ends.
//! - per-folder mutexes. The metadata sidecar is updated read-modify-write,
//!   so two concurrent mutations of one folder would lose an update.
//!
//! Acquire the tree lock first, then folder locks. Reads take no lock:
//! reconciliation makes them safe against half-finished writes.

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

pub type FolderLock = Arc<Mutex<()>>;

/// Tree lock plus a map from resolved folder path to its mutex.
///
/// The map holds weak references; an entry lives only while some operation
/// holds its `Arc`, so deleted and renamed folders do not accumulate.
#[derive(Default)]
pub struct FolderLocks {
    tree: RwLock<()>,
    locks: Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>,
}

impl FolderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared tree lock, held by every mutation that works inside folders.
    pub fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.tree.read()
    }

    /// Exclusive tree lock, held while a subtree is removed or relocated.
    pub fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.tree.write()
    }

    fn get(&self, folder: &Path) -> FolderLock {
        let mut locks = self.locks.lock();
        if let Some(lock) = locks.get(folder).and_then(Weak::upgrade) {
            return lock;
        }
        locks.retain(|_, weak| weak.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(folder.to_path_buf(), Arc::downgrade(&lock));
        lock
    }

    /// Locks for a set of folders, deduplicated and in path order.
    ///
    /// Always acquiring in path order means two operations touching the same
    /// pair of folders cannot deadlock. Callers hold the shared tree lock and
    /// then lock every returned mutex:
    ///
    /// ```ignore
    /// let _tree = self.locks.shared();
    /// let locks = self.locks.acquire(&[&src, &dst]);
    /// let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
    /// ```
    pub fn acquire(&self, folders: &[&Path]) -> Vec<FolderLock> {
        let mut paths: Vec<&Path> = folders.to_vec();
        paths.sort();
        paths.dedup();
        paths.into_iter().map(|p| self.get(p)).collect()
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

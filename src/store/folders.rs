//! Folder create, delete, rename and move.
//!
//! Delete, rename and move hold the exclusive tree lock, so no image
//! mutation can be working anywhere inside the subtree they relocate.

use super::{AssetStore, Result, StoreError, require_dir};
use crate::imaging::ImageBackend;
use crate::paths;
use std::path::Path;
use tracing::info;

impl<B: ImageBackend> AssetStore<B> {
    /// Fail with `InvalidTarget` when `abs` is the storage root itself.
    fn reject_root(&self, abs: &Path, relative: &str) -> Result<()> {
        if abs == self.root {
            return Err(StoreError::InvalidTarget(format!("storage root ({:?})", relative)));
        }
        Ok(())
    }

    /// Create `{parent}/{name}` (and any missing parents). Returns its path.
    ///
    /// Creating a folder that already exists succeeds.
    pub fn create_folder(&self, parent: &str, name: &str) -> Result<String> {
        let relative = paths::join_relative(parent, name.trim_matches('/'));
        paths::reject_reserved_names(&relative)?;
        let abs = self.resolve(&relative)?;
        self.reject_root(&abs, &relative)?;

        let _tree = self.locks.shared();
        std::fs::create_dir_all(&abs)?;
        let path = self.display(&abs);
        info!(folder = %path, "Created folder");
        Ok(path)
    }

    /// Recursively delete a folder and everything below it.
    ///
    /// Deleting a folder that does not exist succeeds.
    pub fn delete_folder(&self, path: &str) -> Result<()> {
        paths::reject_reserved_names(path)?;
        let abs = self.resolve(path)?;
        self.reject_root(&abs, path)?;

        let _tree = self.locks.exclusive();
        match std::fs::remove_dir_all(&abs) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        info!(folder = %self.display(&abs), "Deleted folder");
        Ok(())
    }

    /// Rename a folder in place. Returns the new path.
    pub fn rename_folder(&self, path: &str, new_name: &str) -> Result<String> {
        paths::validate_file_name(new_name)?;
        paths::reject_reserved_names(path)?;
        paths::reject_reserved_names(new_name)?;
        let abs = self.resolve(path)?;
        self.reject_root(&abs, path)?;

        let _tree = self.locks.exclusive();
        require_dir(&abs, path)?;

        let target = abs.with_file_name(new_name);
        if target == abs {
            return Ok(self.display(&abs));
        }
        let new_path = self.display(&target);
        if target.exists() {
            return Err(StoreError::AlreadyExists(new_path));
        }

        std::fs::rename(&abs, &target)?;
        info!(from = %self.display(&abs), to = %new_path, "Renamed folder");
        Ok(new_path)
    }

    /// Move a folder under `new_parent`, keeping its name. Returns the new path.
    ///
    /// The parent is created if missing. Moving a folder into itself or one of
    /// its descendants fails with `MoveIntoSelf`.
    pub fn move_folder(&self, path: &str, new_parent: &str) -> Result<String> {
        paths::reject_reserved_names(path)?;
        paths::reject_reserved_names(new_parent)?;
        let abs = self.resolve(path)?;
        let parent = self.resolve(new_parent)?;
        self.reject_root(&abs, path)?;

        let _tree = self.locks.exclusive();
        require_dir(&abs, path)?;

        let Some(name) = abs.file_name() else {
            return Err(StoreError::InvalidTarget(path.to_string()));
        };
        let target = parent.join(name);
        if target == abs {
            return Ok(self.display(&abs));
        }
        if parent.starts_with(&abs) {
            return Err(StoreError::MoveIntoSelf(self.display(&parent)));
        }
        let new_path = self.display(&target);
        if target.exists() {
            return Err(StoreError::AlreadyExists(new_path));
        }

        std::fs::create_dir_all(&parent)?;
        std::fs::rename(&abs, &target)?;
        info!(from = %self.display(&abs), to = %new_path, "Moved folder");
        Ok(new_path)
    }
}

//! Image mutations: ingest, rename, move, delete, reorder.
//!
//! Each one keeps the original, the primary rendition, every derivative and
//! the sidecar order in step. Sub-steps run sequentially in a fixed order,
//! authoritative ones first.

use super::facets::{self, StepOutcome, find_original, original_extension};
use super::{AssetStore, Result, StoreError, require_dir};
use crate::imaging::{self, ImageBackend};
use crate::metadata::{list_primary_files, read_metadata, reconcile, update_metadata};
use crate::naming;
use crate::paths::{self, ORIGINALS_DIR, PRIMARY_DIR};
use std::path::Path;
use tracing::info;

/// Rename a primary rendition, refusing to overwrite an existing one.
fn move_primary(from: &Path, to: &Path, label: &str) -> Result<()> {
    if to.exists() {
        return Err(StoreError::AlreadyExists(label.to_string()));
    }
    std::fs::rename(from, to).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound(label.to_string()),
        _ => StoreError::Io(e),
    })
}

impl<B: ImageBackend> AssetStore<B> {
    /// Store an upload and return its primary-rendition filename.
    ///
    /// Writes the original, encodes the primary rendition, then appends the
    /// image to the folder's order while generating a derivative for every
    /// configured size straight from `bytes`. The folder is created if it
    /// does not exist. Re-uploading identical bytes under the same name
    /// overwrites the same files.
    pub fn process_and_save_image(
        &self,
        folder: &str,
        upload_name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        paths::reject_reserved_names(folder)?;
        let abs = self.resolve(folder)?;
        let dims = self.backend.identify(bytes)?;
        let names = naming::ingest_names(upload_name, bytes);

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&abs]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();

        let originals = abs.join(ORIGINALS_DIR);
        std::fs::create_dir_all(&originals)?;
        std::fs::write(originals.join(&names.original), bytes)?;

        imaging::create_primary(&self.backend, &abs, &names.primary, bytes, &self.renditions)?;

        let extension = names.original[names.stem.len()..].to_string();
        let generated = update_metadata(&abs, |meta| -> Result<usize> {
            meta.push_image(&names.primary);
            meta.originals.insert(names.primary.clone(), extension);
            for &size in &meta.sizes {
                imaging::generate_derivative(
                    &self.backend,
                    &abs,
                    &names.primary,
                    bytes,
                    size,
                    &self.renditions,
                )?;
            }
            Ok(meta.sizes.len())
        })?;

        info!(
            folder = %self.display(&abs),
            image = %names.primary,
            width = dims.width,
            height = dims.height,
            derivatives = generated,
            "Stored image"
        );
        Ok(names.primary)
    }

    /// Give an image a new name, keeping its content hash.
    ///
    /// `new_name` is slugified; the result is `{slug}-{hash}.webp` with the
    /// hash taken from `old_filename`. Returns the new filename (unchanged if
    /// the rename is a no-op).
    pub fn rename_image(&self, folder: &str, old_filename: &str, new_name: &str) -> Result<String> {
        paths::validate_file_name(old_filename)?;
        paths::reject_reserved_names(folder)?;
        let abs = self.resolve(folder)?;

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&abs]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
        require_dir(&abs, folder)?;

        let old = naming::parse_canonical_name(old_filename);
        let new_stem = naming::canonical_stem(&naming::slugify(new_name), old.hash.as_deref());
        let new_filename = naming::rendition_filename(&new_stem);
        if new_filename == old_filename {
            return Ok(new_filename);
        }

        let primary_dir = abs.join(PRIMARY_DIR);
        move_primary(
            &primary_dir.join(old_filename),
            &primary_dir.join(&new_filename),
            &paths::join_relative(folder, &new_filename),
        )?;

        let recorded = read_metadata(&abs)?.originals.remove(old_filename);
        let mut found_ext = None;
        let outcome = match find_original(&abs, old_filename, recorded.as_deref()) {
            Ok(Some(path)) => {
                let ext = original_extension(&path, &old.stem);
                let target = path.with_file_name(format!("{}{}", new_stem, ext));
                found_ext = Some(ext);
                facets::rename_facet(&path, &target)
            }
            Ok(None) => StepOutcome::Absent,
            Err(e) => StepOutcome::Failed(e),
        };
        outcome.log("rename original", &abs.join(ORIGINALS_DIR));

        let sizes = update_metadata(&abs, |meta| -> Result<_> {
            meta.rename_image(old_filename, &new_filename);
            if let Some(ext) = found_ext {
                meta.originals.insert(new_filename.clone(), ext);
            }
            Ok(meta.sizes.clone())
        })?;

        for size in sizes {
            let dir = abs.join(size.to_string());
            facets::rename_facet(&dir.join(old_filename), &dir.join(&new_filename))
                .log("rename derivative", &dir);
        }

        info!(folder = %self.display(&abs), from = old_filename, to = %new_filename, "Renamed image");
        Ok(new_filename)
    }

    /// Move an image to another folder.
    ///
    /// Derivatives follow only for sizes the destination also has; the rest
    /// are deleted. Sizes only the destination has are not backfilled.
    pub fn move_image(&self, from_folder: &str, filename: &str, to_folder: &str) -> Result<()> {
        if from_folder == to_folder {
            return Ok(());
        }
        paths::reject_reserved_names(from_folder)?;
        paths::reject_reserved_names(to_folder)?;
        paths::validate_file_name(filename)?;
        let src = self.resolve(from_folder)?;
        let dst = self.resolve(to_folder)?;
        if src == dst {
            return Ok(());
        }

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&src, &dst]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
        require_dir(&src, from_folder)?;

        let dst_primary = dst.join(PRIMARY_DIR);
        std::fs::create_dir_all(&dst_primary)?;
        move_primary(
            &src.join(PRIMARY_DIR).join(filename),
            &dst_primary.join(filename),
            &paths::join_relative(to_folder, filename),
        )?;

        let recorded = read_metadata(&src)?.originals.get(filename).cloned();
        let stem = naming::parse_canonical_name(filename).stem;
        let mut moved_ext = None;
        let outcome = match find_original(&src, filename, recorded.as_deref()) {
            Ok(Some(path)) => {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                moved_ext = Some(original_extension(&path, &stem));
                facets::relocate_facet(&path, &dst.join(ORIGINALS_DIR), &name.unwrap_or_default())
            }
            Ok(None) => StepOutcome::Absent,
            Err(e) => StepOutcome::Failed(e),
        };
        outcome.log("move original", &src.join(ORIGINALS_DIR));

        let (source_sizes, recorded_ext) = update_metadata(&src, |meta| -> Result<_> {
            let ext = meta.remove_image(filename);
            Ok((meta.sizes.clone(), ext))
        })?;
        let extension = recorded_ext.or(moved_ext);

        update_metadata(&dst, |meta| -> Result<()> {
            meta.push_image(filename);
            if let Some(ext) = extension {
                meta.originals.insert(filename.to_string(), ext);
            }
            for size in source_sizes {
                let from = src.join(size.to_string()).join(filename);
                if meta.has_size(size) {
                    facets::relocate_facet(&from, &dst.join(size.to_string()), filename)
                        .log("move derivative", &from);
                } else {
                    facets::remove_facet(&from).log("drop derivative", &from);
                }
            }
            Ok(())
        })?;

        info!(
            from = %self.display(&src),
            to = %self.display(&dst),
            image = filename,
            "Moved image"
        );
        Ok(())
    }

    /// Delete an image and all of its facets.
    ///
    /// A primary rendition that is already gone is not an error; the order
    /// entry is still removed.
    pub fn delete_image(&self, folder: &str, filename: &str) -> Result<()> {
        paths::validate_file_name(filename)?;
        paths::reject_reserved_names(folder)?;
        let abs = self.resolve(folder)?;

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&abs]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
        require_dir(&abs, folder)?;

        let primary = abs.join(PRIMARY_DIR).join(filename);
        facets::remove_facet(&primary)
            .log("delete primary", &primary)
            .require_unless_absent()?;

        let recorded = read_metadata(&abs)?.originals.get(filename).cloned();
        let outcome = match find_original(&abs, filename, recorded.as_deref()) {
            Ok(Some(path)) => facets::remove_facet(&path),
            Ok(None) => StepOutcome::Absent,
            Err(e) => StepOutcome::Failed(e),
        };
        outcome.log("delete original", &abs.join(ORIGINALS_DIR));

        update_metadata(&abs, |meta| -> Result<()> {
            meta.remove_image(filename);
            for size in &meta.sizes {
                let path = abs.join(size.to_string()).join(filename);
                facets::remove_facet(&path).log("delete derivative", &path);
            }
            Ok(())
        })?;

        info!(folder = %self.display(&abs), image = filename, "Deleted image");
        Ok(())
    }

    /// Delete several images one after another.
    ///
    /// Stops at the first failure; images before it stay deleted.
    pub fn bulk_delete_images<S: AsRef<str>>(&self, folder: &str, filenames: &[S]) -> Result<()> {
        for filename in filenames {
            self.delete_image(folder, filename.as_ref())?;
        }
        Ok(())
    }

    /// Move several images one after another.
    ///
    /// Stops at the first failure; images before it stay moved.
    pub fn bulk_move_images<S: AsRef<str>>(
        &self,
        from_folder: &str,
        filenames: &[S],
        to_folder: &str,
    ) -> Result<()> {
        for filename in filenames {
            self.move_image(from_folder, filename.as_ref(), to_folder)?;
        }
        Ok(())
    }

    /// Replace the display order.
    ///
    /// The given order is reconciled against disk before it is stored:
    /// unknown names and repeats are dropped, unlisted images are appended.
    pub fn reorder_images<S: AsRef<str>>(&self, folder: &str, order: &[S]) -> Result<Vec<String>> {
        paths::reject_reserved_names(folder)?;
        let abs = self.resolve(folder)?;

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&abs]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
        require_dir(&abs, folder)?;

        let requested: Vec<String> = order.iter().map(|s| s.as_ref().to_string()).collect();
        let on_disk = list_primary_files(&abs)?;
        let stored = update_metadata(&abs, |meta| -> Result<_> {
            meta.order = reconcile(&requested, &on_disk);
            Ok(meta.order.clone())
        })?;

        info!(folder = %self.display(&abs), images = stored.len(), "Reordered images");
        Ok(stored)
    }
}

//! Derivative-size profiles: adding a size backfills it, removing drops it.

use super::facets::find_original;
use super::{AssetStore, Result, StoreError, require_dir};
use crate::paths;
use crate::imaging::{self, BackendError, ImageBackend, SizeSpec};
use crate::metadata::{list_primary_files, update_metadata};
use tracing::{info, warn};

fn parse_size(size: &str) -> Result<SizeSpec> {
    size.parse()
        .map_err(|_| StoreError::InvalidSize(size.to_string()))
}

impl<B: ImageBackend> AssetStore<B> {
    /// Configure a derivative size and generate it for every image.
    ///
    /// Derivatives are generated from each image's original. Images whose
    /// original is missing or cannot be decoded are skipped. Returns how many
    /// derivatives were written; adding a size that is already configured
    /// writes none.
    pub fn add_size_to_folder(&self, folder: &str, size: &str) -> Result<usize> {
        let spec = parse_size(size)?;
        paths::reject_reserved_names(folder)?;
        let abs = self.resolve(folder)?;

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&abs]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
        require_dir(&abs, folder)?;

        let on_disk = list_primary_files(&abs)?;
        let generated = update_metadata(&abs, |meta| -> Result<usize> {
            meta.reconcile(&on_disk);
            if meta.has_size(spec) {
                return Ok(0);
            }
            meta.sizes.push(spec);

            let mut generated = 0;
            for filename in &meta.order {
                let recorded = meta.originals.get(filename).map(String::as_str);
                let Some(original) = find_original(&abs, filename, recorded)? else {
                    tracing::debug!(image = %filename, "No original, derivative skipped");
                    continue;
                };
                let bytes = std::fs::read(&original)?;
                match imaging::generate_derivative(
                    &self.backend,
                    &abs,
                    filename,
                    &bytes,
                    spec,
                    &self.renditions,
                ) {
                    Ok(_) => generated += 1,
                    Err(BackendError::Decode(e)) => {
                        warn!(original = %original.display(), error = %e, "Skipping undecodable original");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(generated)
        })?;

        info!(folder = %self.display(&abs), size = %spec, generated, "Added size");
        Ok(generated)
    }

    /// Drop a derivative size and delete its directory.
    ///
    /// Failure to delete the directory is logged, not returned.
    pub fn remove_size_from_folder(&self, folder: &str, size: &str) -> Result<()> {
        let spec = parse_size(size)?;
        paths::reject_reserved_names(folder)?;
        let abs = self.resolve(folder)?;

        let _tree = self.locks.shared();
        let locks = self.locks.acquire(&[&abs]);
        let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
        require_dir(&abs, folder)?;

        update_metadata(&abs, |meta| -> Result<()> {
            meta.sizes.retain(|s| *s != spec);
            Ok(())
        })?;

        let dir = abs.join(spec.to_string());
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %dir.display(), error = %e, "Failed to remove size directory"),
        }

        info!(folder = %self.display(&abs), size = %spec, "Removed size");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::read_metadata;
    use crate::test_helpers::*;

    #[test]
    fn add_size_backfills_from_originals() {
        let (_tmp, store) = mock_store();
        let a = store_image(&store, "g", "a.jpg", b"aaaa");
        let b = store_image(&store, "g", "b.jpg", b"bbbbbbbb");

        assert_eq!(store.add_size_to_folder("g", "400x300").unwrap(), 2);

        let content = store.get_folder_content("g").unwrap();
        assert_eq!(content.sizes, vec!["400x300".parse::<SizeSpec>().unwrap()]);
        let dir = store.root().join("g/400x300");
        assert_eq!(files_in(&dir), vec![a, b]);
    }

    #[test]
    fn add_size_reads_the_original_not_the_primary() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "a.jpg", b"twelve bytes");
        store.add_size_to_folder("g", "40x30").unwrap();

        let op = store
            .backend()
            .get_operations()
            .into_iter()
            .find(|op| matches!(op, crate::imaging::backend::tests::RecordedOp::Cover { .. }));
        assert!(matches!(
            op,
            Some(crate::imaging::backend::tests::RecordedOp::Cover { source_len: 12, .. })
        ));
    }

    #[test]
    fn add_existing_size_is_noop() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "a.jpg", b"a");
        store.add_size_to_folder("g", "40x30").unwrap();
        assert_eq!(store.add_size_to_folder("g", "40x30").unwrap(), 0);
        assert_eq!(read_metadata(&store.root().join("g")).unwrap().sizes.len(), 1);
    }

    #[test]
    fn add_size_skips_missing_originals() {
        let (_tmp, store) = mock_store();
        let keep = store_image(&store, "g", "keep.jpg", b"k");
        let orphan = store_image(&store, "g", "orphan.jpg", b"o");
        let stem = orphan.trim_end_matches(".webp");
        std::fs::remove_file(store.root().join("g/originals").join(format!("{stem}.jpg")))
            .unwrap();

        assert_eq!(store.add_size_to_folder("g", "40x30").unwrap(), 1);
        assert_eq!(files_in(&store.root().join("g/40x30")), vec![keep]);
    }

    #[test]
    fn add_size_skips_undecodable_originals() {
        let (_tmp, store) = mock_store();
        let good = store_image(&store, "g", "good.jpg", b"good");
        let bad = store_image(&store, "g", "bad.jpg", b"bad");
        let stem = bad.trim_end_matches(".webp");
        std::fs::write(
            store.root().join("g/originals").join(format!("{stem}.jpg")),
            b"NOTIMG",
        )
        .unwrap();

        assert_eq!(store.add_size_to_folder("g", "40x30").unwrap(), 1);
        assert_eq!(files_in(&store.root().join("g/40x30")), vec![good]);
    }

    #[test]
    fn add_size_covers_images_missing_from_order() {
        let (_tmp, store) = mock_store();
        let name = store_image(&store, "g", "a.jpg", b"a");
        crate::metadata::update_metadata::<_, std::io::Error>(&store.root().join("g"), |meta| {
            meta.order.clear();
            Ok(())
        })
        .unwrap();

        assert_eq!(store.add_size_to_folder("g", "40x30").unwrap(), 1);
        assert_eq!(files_in(&store.root().join("g/40x30")), vec![name]);
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "a.jpg", b"a");
        for bad in ["400", "0x300", "400x0", "axb", "400x300x2", "../400x300"] {
            assert!(
                matches!(store.add_size_to_folder("g", bad), Err(StoreError::InvalidSize(_))),
                "{bad} accepted by add"
            );
            assert!(
                matches!(store.remove_size_from_folder("g", bad), Err(StoreError::InvalidSize(_))),
                "{bad} accepted by remove"
            );
        }
    }

    #[test]
    fn remove_size_deletes_directory_and_entry() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "a.jpg", b"a");
        store.add_size_to_folder("g", "40x30").unwrap();
        store.add_size_to_folder("g", "80x60").unwrap();

        store.remove_size_from_folder("g", "40x30").unwrap();

        let folder = store.root().join("g");
        assert!(!folder.join("40x30").exists());
        assert!(folder.join("80x60").is_dir());
        assert_eq!(
            store.get_folder_content("g").unwrap().sizes,
            vec!["80x60".parse::<SizeSpec>().unwrap()]
        );
    }

    #[test]
    fn remove_unconfigured_size_is_ok() {
        let (_tmp, store) = mock_store();
        store.create_folder("", "g").unwrap();
        store.remove_size_from_folder("g", "40x30").unwrap();
    }

    #[test]
    fn new_uploads_get_configured_sizes() {
        let (_tmp, store) = mock_store();
        store.create_folder("", "g").unwrap();
        store.add_size_to_folder("g", "40x30").unwrap();
        let name = store_image(&store, "g", "late.jpg", b"late");
        assert!(store.root().join("g/40x30").join(name).is_file());
    }

    #[test]
    fn internal_directories_take_no_sizes() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "a.jpg", b"a");

        assert!(store.add_size_to_folder("g/webp", "10x10").unwrap_err().is_reserved_name());
        assert!(
            store
                .remove_size_from_folder("g/originals", "10x10")
                .unwrap_err()
                .is_reserved_name()
        );
        assert!(!store.root().join("g/webp/index.json").exists());
        assert!(!store.root().join("g/webp/10x10").exists());
    }
}

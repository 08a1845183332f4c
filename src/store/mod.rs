//! The asset store: folder tree, folder contents, and every mutation.
//!
//! ## On-disk layout
//!
//! ```text
//! {root}/
//! └── travel/                      # folder "travel"
//!     ├── index.json               # FolderMetadata (order, sizes, ...)
//!     ├── originals/dawn-1a2b3c4d.jpg
//!     ├── webp/dawn-1a2b3c4d.webp  # primary rendition = identity
//!     ├── 400x300/dawn-1a2b3c4d.webp
//!     └── japan/                   # subfolder "travel/japan"
//! ```
//!
//! ## Consistency model
//!
//! A mutation fans out into several filesystem steps plus one sidecar update.
//! There is no rollback. Instead:
//!
//! - steps on the primary rendition and the sidecar propagate their errors;
//! - steps on originals and derivatives are best-effort
//!   (see [`facets::StepOutcome`]);
//! - every read reconciles the sidecar order against `webp/`, so drift left
//!   behind by a failed step heals on the next listing.
//!
//! Mutations on the same folder are serialized in-process through
//! [`locks::FolderLocks`]. Folder deletes, renames and moves exclude every
//! other mutation for their duration.

pub mod facets;
mod folders;
mod images;
pub mod locks;
mod sizes;

use crate::config::StoreConfig;
use crate::imaging::{BackendError, ImageBackend, RenditionConfig, RustBackend};
use crate::metadata::{list_primary_files, read_metadata};
use crate::naming::{parse_canonical_name, upload_slug};
use crate::paths::{self, PathError};
use crate::types::{FolderContent, FolderNode};
use locks::FolderLocks;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Cannot move a folder into itself or its subfolder: {0}")]
    MoveIntoSelf(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid size {0:?}: expected WIDTHxHEIGHT")]
    InvalidSize(String),
    #[error("Operation not allowed on {0}")]
    InvalidTarget(String),
    #[error("Image processing failed: {0}")]
    Encode(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub fn is_path_escape(&self) -> bool {
        matches!(self, Self::Path(PathError::Escape(_)))
    }

    pub fn is_reserved_name(&self) -> bool {
        matches!(self, Self::Path(PathError::ReservedName(_)))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// File-backed store rooted at one directory.
///
/// Generic over the image backend so tests can swap in a recording mock.
pub struct AssetStore<B = RustBackend> {
    root: PathBuf,
    backend: B,
    renditions: RenditionConfig,
    locks: FolderLocks,
}

impl AssetStore<RustBackend> {
    /// Store at `root` with the production backend and default encodings.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_backend(root, RustBackend::new(), RenditionConfig::default())
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::with_backend(
            &config.storage_root,
            RustBackend::new(),
            config.encoding.renditions(),
        )
    }
}

impl<B: ImageBackend> AssetStore<B> {
    pub fn with_backend(
        root: impl AsRef<Path>,
        backend: B,
        renditions: RenditionConfig,
    ) -> Result<Self> {
        Ok(Self {
            root: paths::absolute_root(root.as_ref())?,
            backend,
            renditions,
            locks: FolderLocks::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the storage root if missing. Idempotent.
    pub fn ensure_storage_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        Ok(paths::resolve(&self.root, relative)?)
    }

    /// Resolve a folder path that must already exist as a directory.
    fn existing_folder(&self, relative: &str) -> Result<PathBuf> {
        let abs = self.resolve(relative)?;
        require_dir(&abs, relative)?;
        Ok(abs)
    }

    fn display(&self, abs: &Path) -> String {
        paths::relative_display(&self.root, abs)
    }

    /// Recursive tree of user folders below `path`, depth-first, sorted by name.
    ///
    /// Internal directories (`originals`, `webp`, size directories) are skipped.
    pub fn get_folder_tree(&self, path: &str) -> Result<Vec<FolderNode>> {
        let abs = self.existing_folder(path)?;
        Ok(build_tree(&abs, &self.display(&abs))?)
    }

    /// Images (in display order), sizes and subfolders of one folder.
    ///
    /// The returned order is reconciled against `webp/`: it lists every
    /// primary rendition on disk exactly once and nothing else.
    pub fn get_folder_content(&self, path: &str) -> Result<FolderContent> {
        let abs = self.existing_folder(path)?;
        let mut meta = read_metadata(&abs)?;
        meta.reconcile(&list_primary_files(&abs)?);

        Ok(FolderContent {
            path: self.display(&abs),
            title: meta.title,
            images: meta.order,
            sizes: meta.sizes,
            subfolders: list_subfolders(&abs)?,
        })
    }

    /// Which candidate upload names share a slug with an existing image.
    ///
    /// Returns the matching candidates as given, in input order. A folder
    /// that does not exist yet has no duplicates.
    pub fn find_duplicates<S: AsRef<str>>(
        &self,
        folder: &str,
        candidates: &[S],
    ) -> Result<Vec<String>> {
        let abs = self.resolve(folder)?;
        if !abs.is_dir() {
            return Ok(Vec::new());
        }
        let existing: HashSet<String> = list_primary_files(&abs)?
            .iter()
            .map(|f| parse_canonical_name(f).slug)
            .collect();

        let mut duplicates = Vec::new();
        for candidate in candidates {
            let name: &str = candidate.as_ref();
            if existing.contains(&upload_slug(name)) {
                duplicates.push(name.to_string());
            }
        }
        Ok(duplicates)
    }

    /// Existing images in `folder` whose slug matches an upload name.
    pub(crate) fn images_sharing_slug(
        &self,
        folder: &str,
        upload_name: &str,
    ) -> Result<Vec<String>> {
        let abs = self.resolve(folder)?;
        if !abs.is_dir() {
            return Ok(Vec::new());
        }
        let slug = upload_slug(upload_name);
        Ok(list_primary_files(&abs)?
            .into_iter()
            .filter(|f| parse_canonical_name(f).slug == slug)
            .collect())
    }
}

fn require_dir(abs: &Path, relative: &str) -> Result<()> {
    if !abs.is_dir() {
        return Err(StoreError::NotFound(relative.to_string()));
    }
    Ok(())
}

/// Immediate child directories that are user folders, sorted by name.
fn list_subfolders(abs: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(abs)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !paths::is_reserved_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn build_tree(abs: &Path, relative: &str) -> io::Result<Vec<FolderNode>> {
    list_subfolders(abs)?
        .into_iter()
        .map(|name| {
            let path = paths::join_relative(relative, &name);
            let children = build_tree(&abs.join(&name), &path)?;
            Ok(FolderNode {
                name,
                path,
                children,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::SizeSpec;
    use crate::test_helpers::*;

    #[test]
    fn concrete_scenario_single_upload() {
        let (_tmp, store) = mock_store();
        store.create_folder("", "gallery").unwrap();
        let bytes = b"0123456789";
        let stored = store
            .process_and_save_image("gallery", "My Photo.png", bytes)
            .unwrap();

        let hash = crate::naming::content_hash(bytes);
        assert_eq!(stored, format!("my-photo-{hash}.webp"));

        let content = store.get_folder_content("gallery").unwrap();
        assert_eq!(content.path, "gallery");
        assert_eq!(content.images, vec![stored]);
        assert!(content.subfolders.is_empty());
        assert!(content.sizes.is_empty());
    }

    #[test]
    fn content_of_missing_folder_is_not_found() {
        let (_tmp, store) = mock_store();
        assert!(matches!(
            store.get_folder_content("nowhere"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn content_escape_is_rejected() {
        let (_tmp, store) = mock_store();
        assert!(store.get_folder_content("../..").unwrap_err().is_path_escape());
    }

    #[test]
    fn content_reconciles_against_disk() {
        let (_tmp, store) = mock_store();
        let a = store_image(&store, "g", "a.jpg", b"aaa");
        let b = store_image(&store, "g", "b.jpg", b"bbb");
        let folder = store.root().join("g");

        // Sidecar lists a vanished file and misses one that was copied in
        std::fs::write(folder.join("webp/zz-manual.webp"), b"x").unwrap();
        crate::metadata::update_metadata::<_, io::Error>(&folder, |meta| {
            meta.order = vec![b.clone(), "ghost-00000000.webp".into(), a.clone()];
            Ok(())
        })
        .unwrap();

        let content = store.get_folder_content("g").unwrap();
        assert_eq!(content.images, vec![b, a, "zz-manual.webp".to_string()]);
        assert_each_on_disk_once(&folder, &content.images);
    }

    #[test]
    fn content_lists_subfolders_but_not_internal_dirs() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "a.jpg", b"aaa");
        store.add_size_to_folder("g", "40x30").unwrap();
        store.create_folder("g", "beta").unwrap();
        store.create_folder("g", "alpha").unwrap();

        let content = store.get_folder_content("g").unwrap();
        assert_eq!(content.subfolders, vec!["alpha", "beta"]);
        assert_eq!(content.sizes, vec!["40x30".parse::<SizeSpec>().unwrap()]);
    }

    #[test]
    fn tree_is_recursive_and_skips_internal_dirs() {
        let (_tmp, store) = mock_store();
        store.create_folder("", "travel").unwrap();
        store.create_folder("travel", "japan").unwrap();
        store.create_folder("travel/japan", "kyoto").unwrap();
        store.create_folder("", "animals").unwrap();
        store_image(&store, "travel", "a.jpg", b"aaa");

        let tree = store.get_folder_tree("").unwrap();
        assert_eq!(
            tree_paths(&tree),
            vec!["animals", "travel", "travel/japan", "travel/japan/kyoto"]
        );
        assert_eq!(tree[1].children[0].name, "japan");
    }

    #[test]
    fn subtree_paths_are_root_relative() {
        let (_tmp, store) = mock_store();
        store.create_folder("", "travel").unwrap();
        store.create_folder("travel", "japan").unwrap();

        let tree = store.get_folder_tree("travel").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].path, "travel/japan");
    }

    #[test]
    fn duplicates_match_by_slug() {
        let (_tmp, store) = mock_store();
        store_image(&store, "g", "Beach Day.jpg", b"one");

        let dups = store
            .find_duplicates("g", &["beach day.png", "Mountains.jpg", "BEACH   DAY.jpeg"])
            .unwrap();
        assert_eq!(dups, vec!["beach day.png", "BEACH   DAY.jpeg"]);
    }

    #[test]
    fn duplicates_in_missing_folder_are_empty() {
        let (_tmp, store) = mock_store();
        assert!(store.find_duplicates("new", &["a.jpg"]).unwrap().is_empty());
    }
}

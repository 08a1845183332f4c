//! Shared test utilities for the store test suite.
//!
//! Stores are built on [`MockBackend`] inside a fresh [`TempDir`], so tests
//! exercise real filesystem layout without encoding anything.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let (_tmp, store) = mock_store();
//! add_size(&store, "gallery", "400x300");
//! let name = store_image(&store, "gallery", "Dawn.jpg", b"pixels");
//!
//! assert_eq!(files_in(&store.root().join("gallery/400x300")), vec![name]);
//! ```

use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

use crate::imaging::RenditionConfig;
use crate::imaging::backend::tests::MockBackend;
use crate::store::AssetStore;
use crate::types::FolderNode;

// =========================================================================
// Fixture setup
// =========================================================================

/// Empty store rooted in a temp directory. Keep the `TempDir` alive.
pub fn mock_store() -> (TempDir, AssetStore<MockBackend>) {
    let tmp = TempDir::new().unwrap();
    let store = AssetStore::with_backend(
        tmp.path().join("storage"),
        MockBackend::new(),
        RenditionConfig::default(),
    )
    .unwrap();
    store.ensure_storage_root().unwrap();
    (tmp, store)
}

/// Ingest an image, panicking with context on failure.
pub fn store_image(
    store: &AssetStore<MockBackend>,
    folder: &str,
    name: &str,
    bytes: &[u8],
) -> String {
    store
        .process_and_save_image(folder, name, bytes)
        .unwrap_or_else(|e| panic!("ingest of '{name}' into '{folder}' failed: {e}"))
}

/// Configure a size on a folder, creating the folder first if needed.
pub fn add_size(store: &AssetStore<MockBackend>, folder: &str, size: &str) {
    std::fs::create_dir_all(store.root().join(folder)).unwrap();
    store
        .add_size_to_folder(folder, size)
        .unwrap_or_else(|e| panic!("adding {size} to '{folder}' failed: {e}"));
}

// =========================================================================
// Filesystem lookups
// =========================================================================

/// Regular file names in a directory, sorted. Missing directory is empty.
pub fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().unwrap().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Flatten a folder tree into its paths, depth-first.
pub fn tree_paths(nodes: &[FolderNode]) -> Vec<String> {
    let mut out = Vec::new();
    for node in nodes {
        out.push(node.path.clone());
        out.extend(tree_paths(&node.children));
    }
    out
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert that `images` names every file in `{folder}/webp/` exactly once.
pub fn assert_each_on_disk_once(folder: &Path, images: &[String]) {
    let on_disk = files_in(&folder.join("webp"));
    let listed: HashSet<&String> = images.iter().collect();
    assert_eq!(
        listed.len(),
        images.len(),
        "order has duplicates: {images:?}"
    );
    let mut sorted = images.to_vec();
    sorted.sort();
    assert_eq!(sorted, on_disk, "order does not match webp/ contents");
}

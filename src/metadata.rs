//! Per-folder metadata sidecar (`index.json`).
//!
//! Each folder carries one JSON record next to its image directories:
//!
//! ```json
//! {
//!   "order": ["dawn-1a2b3c4d.webp", "dusk-9f8e7d6c.webp"],
//!   "sizes": ["400x300"],
//!   "originals": { "dawn-1a2b3c4d.webp": ".jpg" }
//! }
//! ```
//!
//! ## Who is authoritative
//!
//! The sidecar and the `webp/` directory can drift: a write may be
//! interrupted, or someone may copy files in by hand. Neither side wins
//! outright:
//!
//! - **Disk is append-authoritative**: a primary rendition present on disk but
//!   missing from `order` is appended.
//! - **Metadata is order-authoritative**: entries keep their recorded position;
//!   entries whose file is gone are dropped.
//!
//! [`reconcile`] applies these rules and runs on every content read, so drift
//! never survives the next listing.
//!
//! ## Updates
//!
//! [`update_metadata`] is read → mutate → write. It takes no lock of its own;
//! the store serializes mutations per folder before calling it. The write is
//! a full replacement through a temp file and rename.

use crate::imaging::SizeSpec;
use crate::paths::{METADATA_FILE, PRIMARY_DIR};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;

const TEMP_SUFFIX: &str = ".tmp";

/// The folder's sidecar record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Primary-rendition filenames in display order.
    #[serde(default)]
    pub order: Vec<String>,
    /// Derivative sizes configured for this folder.
    #[serde(default)]
    pub sizes: Vec<SizeSpec>,
    /// Primary filename → extension of its original (with the dot).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub originals: BTreeMap<String, String>,
}

impl FolderMetadata {
    pub fn has_size(&self, size: SizeSpec) -> bool {
        self.sizes.contains(&size)
    }

    /// Append to the order unless already present.
    pub fn push_image(&mut self, filename: &str) {
        if !self.order.iter().any(|f| f == filename) {
            self.order.push(filename.to_string());
        }
    }

    /// Drop an image from the order, returning its recorded original extension.
    pub fn remove_image(&mut self, filename: &str) -> Option<String> {
        self.order.retain(|f| f != filename);
        self.originals.remove(filename)
    }

    /// Replace `old` with `new` in place, carrying its original extension along.
    pub fn rename_image(&mut self, old: &str, new: &str) {
        for entry in self.order.iter_mut() {
            if entry == old {
                *entry = new.to_string();
            }
        }
        if let Some(ext) = self.originals.remove(old) {
            self.originals.insert(new.to_string(), ext);
        }
    }

    /// Align `order` with the primary renditions actually on disk.
    pub fn reconcile(&mut self, on_disk: &[String]) {
        self.order = reconcile(&self.order, on_disk);
        let present: HashSet<&str> = self.order.iter().map(String::as_str).collect();
        self.originals.retain(|name, _| present.contains(name.as_str()));
    }
}

/// Merge recorded order with disk contents.
///
/// Keeps recorded entries that exist on disk (first occurrence only), then
/// appends on-disk files the record doesn't mention, in the order given.
/// Every on-disk file appears exactly once in the result.
pub fn reconcile(order: &[String], on_disk: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = on_disk.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(on_disk.len());
    let mut result = Vec::with_capacity(on_disk.len());

    for name in order {
        if existing.contains(name.as_str()) && seen.insert(name.as_str()) {
            result.push(name.clone());
        }
    }
    for name in on_disk {
        if seen.insert(name.as_str()) {
            result.push(name.clone());
        }
    }
    result
}

/// Read a folder's sidecar.
///
/// A missing sidecar is the default record. A sidecar that fails to parse is
/// logged and also treated as the default record; reconciliation restores the
/// order from disk on the next read.
pub fn read_metadata(folder: &Path) -> io::Result<FolderMetadata> {
    let path = folder.join(METADATA_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FolderMetadata::default()),
        Err(e) => return Err(e),
    };
    match serde_json::from_str(&content) {
        Ok(meta) => Ok(meta),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable metadata sidecar");
            Ok(FolderMetadata::default())
        }
    }
}

/// Overwrite a folder's sidecar with pretty-printed JSON.
pub fn write_metadata(folder: &Path, meta: &FolderMetadata) -> io::Result<()> {
    let path = folder.join(METADATA_FILE);
    let tmp = folder.join(format!("{}{}", METADATA_FILE, TEMP_SUFFIX));
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)
}

/// Read, apply `mutator`, write back.
///
/// The mutator may do further I/O (e.g. generate derivatives) while the
/// record is held. If it fails, nothing is written and the error propagates.
pub fn update_metadata<T, E>(
    folder: &Path,
    mutator: impl FnOnce(&mut FolderMetadata) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<io::Error>,
{
    let mut meta = read_metadata(folder)?;
    let value = mutator(&mut meta)?;
    write_metadata(folder, &meta)?;
    Ok(value)
}

/// Primary renditions present in `{folder}/webp/`, sorted by name.
///
/// Only regular files with a `.webp` extension (any case) count. A missing
/// directory is an empty listing.
pub fn list_primary_files(folder: &Path) -> io::Result<Vec<String>> {
    let dir = folder.join(PRIMARY_DIR);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_webp = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("webp"));
        if is_webp {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

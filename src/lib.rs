//! # Asset Store
//!
//! A hierarchical, file-backed image store. Folders are directories, images
//! are files, and a small JSON sidecar per folder records display order and
//! the derivative sizes the folder wants.
//!
//! # Image Identity
//!
//! Every upload is named `{slug}-{hash}` where the slug comes from the upload
//! name and the hash is the first 8 hex characters of the content's MD5.
//! That stem is shared by all copies of one image:
//!
//! ```text
//! originals/my-photo-1a2b3c4d.png     uploaded bytes, untouched
//! webp/my-photo-1a2b3c4d.webp         primary rendition (≤2000px wide, q85)
//! 400x300/my-photo-1a2b3c4d.webp      derivative (cover-fit, q80)
//! ```
//!
//! The primary rendition's filename is the image's identity everywhere: in
//! the sidecar order, in API results, and as the argument to rename, move and
//! delete.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Containment of caller-supplied paths, reserved directory names |
//! | [`naming`] | Slugs, content hashes, canonical filenames |
//! | [`metadata`] | `index.json` sidecar: read, write, reconcile against disk |
//! | [`imaging`] | Decode, resize and WebP encode behind [`imaging::ImageBackend`] |
//! | [`store`] | [`AssetStore`]: listings and every mutation |
//! | [`uploads`] | Batch upload with keep/replace duplicate policy |
//! | [`config`] | TOML config over stock defaults, env override |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`types`] | Serializable views (`FolderNode`, `FolderContent`) |
//! | [`output`] | CLI text formatting |
//!
//! # Design Decisions
//!
//! ## Reconcile on Read
//!
//! Mutations touch several files and a sidecar without a transaction. Rather
//! than attempt rollback, every content listing merges the sidecar order with
//! what is actually in `webp/`: vanished files drop out, unknown files are
//! appended. A half-finished operation is visible at worst as an image in
//! the wrong position, never as a dangling entry.
//!
//! ## Synchronous API
//!
//! Encoding is CPU-bound and the filesystem calls block, so the store is
//! plain synchronous Rust. Async servers call it from a blocking pool.
//! Writers on the same folder are serialized by an in-process lock, and
//! folder deletes, renames and moves wait for every writer. Readers never
//! wait.
//!
//! ## Self-Contained Imaging
//!
//! Decoding and resizing use the `image` crate (Lanczos3). Lossy WebP
//! encoding uses the `webp` crate, which builds libwebp from source. No
//! ImageMagick or other system tools are needed at runtime.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod paths;
pub mod store;
pub mod types;
pub mod uploads;

pub use store::{AssetStore, StoreError};

#[cfg(test)]
pub(crate) mod test_helpers;

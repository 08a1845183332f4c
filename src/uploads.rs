//! Batch uploads with duplicate handling.
//!
//! Duplicate detection is by slug: an upload named `Beach Day.png` collides
//! with any stored `beach-day-*.webp`, whatever its content. The caller picks
//! what happens on a collision through [`UploadPolicy`]. Each file gets its
//! own [`UploadOutcome`]; one bad file does not stop the batch.

use crate::imaging::ImageBackend;
use crate::store::{AssetStore, StoreError};
use tracing::{info, warn};

/// One file of a batch.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// What to do with existing images that share an upload's slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPolicy {
    /// Leave them; the upload is stored alongside.
    #[default]
    Keep,
    /// Delete them before storing the upload, once it is known to decode.
    Replace,
}

#[derive(Debug)]
pub enum UploadOutcome {
    /// Stored under the returned primary-rendition filename.
    Stored(String),
    /// Empty file, not attempted.
    Skipped,
    Failed(StoreError),
}

/// Per-file outcomes, in input order.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub results: Vec<(String, UploadOutcome)>,
}

impl UploadReport {
    pub fn stored(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter_map(|(_, outcome)| match outcome {
            UploadOutcome::Stored(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &StoreError)> {
        self.results.iter().filter_map(|(name, outcome)| match outcome {
            UploadOutcome::Failed(e) => Some((name.as_str(), e)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Ingest a batch of files into `folder`, one after another.
pub fn upload_files<B: ImageBackend>(
    store: &AssetStore<B>,
    folder: &str,
    files: &[Upload],
    policy: UploadPolicy,
) -> UploadReport {
    let mut report = UploadReport::default();
    for file in files {
        let outcome = if file.bytes.is_empty() {
            warn!(file = %file.name, "Skipping empty upload");
            UploadOutcome::Skipped
        } else {
            match upload_one(store, folder, file, policy) {
                Ok(stored) => UploadOutcome::Stored(stored),
                Err(e) => {
                    warn!(file = %file.name, error = %e, "Upload failed");
                    UploadOutcome::Failed(e)
                }
            }
        };
        report.results.push((file.name.clone(), outcome));
    }

    info!(
        folder,
        stored = report.stored().count(),
        total = files.len(),
        "Upload batch finished"
    );
    report
}

fn upload_one<B: ImageBackend>(
    store: &AssetStore<B>,
    folder: &str,
    file: &Upload,
    policy: UploadPolicy,
) -> Result<String, StoreError> {
    if policy == UploadPolicy::Replace {
        // An upload that will not decode must not cost the image it replaces
        store.backend().identify(&file.bytes)?;
        let existing = store.images_sharing_slug(folder, &file.name)?;
        store.bulk_delete_images(folder, &existing)?;
    }
    store.process_and_save_image(folder, &file.name, &file.bytes)
}

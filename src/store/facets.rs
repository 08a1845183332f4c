//! Best-effort handling of an image's non-authoritative facets.
//!
//! An image lives in up to three places (original, primary rendition,
//! derivatives) but only the primary rendition and the metadata order are
//! authoritative. Steps touching the other facets must not abort an
//! operation, yet "the file was never there" and "the disk refused" are
//! different situations. [`StepOutcome`] keeps them apart so the second one
//! is at least visible in the logs.

use crate::paths::ORIGINALS_DIR;
use std::io;
use std::path::{Path, PathBuf};

/// Result of one best-effort filesystem sub-step.
#[derive(Debug)]
pub enum StepOutcome {
    Done,
    /// The facet did not exist; nothing to do.
    Absent,
    /// The facet existed but the operation failed.
    Failed(io::Error),
}

impl StepOutcome {
    fn from_io(result: io::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::Absent,
            Err(e) => Self::Failed(e),
        }
    }

    /// Record the outcome: absence at debug, failure at warn.
    pub fn log(self, step: &str, path: &Path) -> Self {
        match &self {
            Self::Done => {}
            Self::Absent => tracing::debug!(step, path = %path.display(), "Facet absent, skipped"),
            Self::Failed(e) => {
                tracing::warn!(step, path = %path.display(), error = %e, "Best-effort step failed")
            }
        }
        self
    }

    /// Escalate to an error: for authoritative facets only absence is tolerated.
    pub fn require_unless_absent(self) -> io::Result<()> {
        match self {
            Self::Done | Self::Absent => Ok(()),
            Self::Failed(e) => Err(e),
        }
    }
}

pub fn rename_facet(from: &Path, to: &Path) -> StepOutcome {
    StepOutcome::from_io(std::fs::rename(from, to))
}

pub fn remove_facet(path: &Path) -> StepOutcome {
    StepOutcome::from_io(std::fs::remove_file(path))
}

/// Move a facet into another directory, creating the directory first.
pub fn relocate_facet(from: &Path, to_dir: &Path, filename: &str) -> StepOutcome {
    if !from.exists() {
        return StepOutcome::Absent;
    }
    if let Err(e) = std::fs::create_dir_all(to_dir) {
        return StepOutcome::Failed(e);
    }
    rename_facet(from, &to_dir.join(filename))
}

/// Locate the original of a primary rendition inside `{folder}/originals/`.
///
/// `recorded_ext` is the extension stored in the sidecar, if any; it is tried
/// first. Otherwise the directory is scanned for `{stem}.*` (or the bare
/// stem), picking the first match by name. Returns `None` when nothing
/// matches or the directory does not exist.
pub fn find_original(
    folder: &Path,
    primary_filename: &str,
    recorded_ext: Option<&str>,
) -> io::Result<Option<PathBuf>> {
    let dir = folder.join(ORIGINALS_DIR);
    let stem = crate::naming::parse_canonical_name(primary_filename).stem;

    if let Some(ext) = recorded_ext {
        let candidate = dir.join(format!("{}{}", stem, ext));
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let prefix = format!("{}.", stem);
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if (name == stem || name.starts_with(&prefix)) && entry.file_type()?.is_file() {
            matches.push(name);
        }
    }
    matches.sort();
    Ok(matches.into_iter().next().map(|name| dir.join(name)))
}

/// Extension part (with the dot) of an original's filename, given its stem.
pub fn original_extension(original: &Path, stem: &str) -> String {
    original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .and_then(|n| n.strip_prefix(stem).map(str::to_string))
        .unwrap_or_default()
}

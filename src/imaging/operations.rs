//! High-level rendition operations.
//!
//! These functions decide where a rendition goes and with which parameters,
//! then hand the pixel work to the backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{CoverParams, FitWidthParams, Quality, SizeSpec};
use crate::paths::PRIMARY_DIR;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Encoding settings for the renditions the store produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionConfig {
    /// Width cap of the primary rendition.
    pub primary_max_width: u32,
    pub primary_quality: Quality,
    pub derivative_quality: Quality,
}

impl Default for RenditionConfig {
    fn default() -> Self {
        Self {
            primary_max_width: 2000,
            primary_quality: Quality::new(85),
            derivative_quality: Quality::new(80),
        }
    }
}

/// Path of a derivative: `{folder}/{WIDTHxHEIGHT}/{filename}`.
pub fn derivative_path(folder: &Path, size: SizeSpec, filename: &str) -> PathBuf {
    folder.join(size.to_string()).join(filename)
}

/// Write the primary rendition to `{folder}/webp/{filename}`.
///
/// Creates the `webp/` directory if needed.
pub fn create_primary(
    backend: &impl ImageBackend,
    folder: &Path,
    filename: &str,
    source: &[u8],
    config: &RenditionConfig,
) -> Result<PathBuf> {
    let dir = folder.join(PRIMARY_DIR);
    std::fs::create_dir_all(&dir)?;
    let output = dir.join(filename);
    backend.fit_width(&FitWidthParams {
        source,
        output: output.clone(),
        max_width: config.primary_max_width,
        quality: config.primary_quality,
    })?;
    Ok(output)
}

/// Write one derivative to `{folder}/{size}/{filename}`.
///
/// Idempotent: re-running with the same inputs overwrites the prior output.
pub fn generate_derivative(
    backend: &impl ImageBackend,
    folder: &Path,
    filename: &str,
    source: &[u8],
    size: SizeSpec,
    config: &RenditionConfig,
) -> Result<PathBuf> {
    let output = derivative_path(folder, size, filename);
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    backend.cover(&CoverParams {
        source,
        output: output.clone(),
        size,
        quality: config.derivative_quality,
    })?;
    Ok(output)
}

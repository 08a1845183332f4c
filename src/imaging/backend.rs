//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two renditions the store produces:
//! a width-capped primary and a fixed-size cover-fit derivative. Both take the
//! source as an in-memory buffer so ingest can encode straight from the upload
//! without re-reading anything from disk.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{CoverParams, FitWidthParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source is not a decodable image: {0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations write the encoded rendition to `params.output`, replacing
/// any existing file. The parent directory must already exist.
pub trait ImageBackend: Send + Sync {
    /// Decode just enough of `source` to report its dimensions.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Primary rendition: cap the width, keep the aspect ratio, never upscale.
    fn fit_width(&self, params: &FitWidthParams) -> Result<(), BackendError>;

    /// Derivative: resize to cover the exact target size, then center-crop.
    fn cover(&self, params: &CoverParams) -> Result<(), BackendError>;
}

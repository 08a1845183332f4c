//! Production backend built on the `image` and `webp` crates.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image::load_from_memory` |
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Cover crop | fill resize + centered `crop_imm` |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_fill_dimensions, calculate_fit_width};
use super::params::{CoverParams, FitWidthParams, Quality};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Backend using the `image` crate for decode/resize and libwebp for encoding.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(source: &[u8]) -> Result<DynamicImage, BackendError> {
    let img = image::load_from_memory(source).map_err(|e| BackendError::Decode(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(BackendError::Decode("image has zero dimensions".into()));
    }
    Ok(img)
}

/// Encode as lossy WebP and write to `path`, replacing any existing file.
fn save_webp(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| BackendError::Encode(format!("{:?}", e)))?;
    std::fs::write(path, &*encoded)?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(source))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn fit_width(&self, params: &FitWidthParams) -> Result<(), BackendError> {
        let img = decode(params.source)?;
        let (w, h) = calculate_fit_width((img.width(), img.height()), params.max_width);
        let fitted = if (w, h) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(w, h, FilterType::Lanczos3)
        };
        save_webp(&fitted, &params.output, params.quality)
    }

    fn cover(&self, params: &CoverParams) -> Result<(), BackendError> {
        let img = decode(params.source)?;
        let target = (params.size.width, params.size.height);
        let (fill_w, fill_h) = calculate_fill_dimensions((img.width(), img.height()), target);
        let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);

        // Center-crop the overflowing axis
        let x = (fill_w - target.0) / 2;
        let y = (fill_h - target.1) / 2;
        let cropped = filled.crop_imm(x, y, target.0, target.1);

        save_webp(&cropped, &params.output, params.quality)
    }
}

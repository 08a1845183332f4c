//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. The store decides
//! which renditions an image needs; the [`backend`](super::backend) does the
//! pixel work. Keeping them apart lets store logic run against a mock.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`SizeSpec`]: A derivative size, written `WIDTHxHEIGHT` (`400x300`).
//! - [`FitWidthParams`]: Primary rendition: cap the width, keep the aspect ratio.
//! - [`CoverParams`]: Derivative: crop-to-fill exact dimensions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Target dimensions of a derivative rendition.
///
/// Parsed from and displayed as `WIDTHxHEIGHT`; both sides must be non-zero.
/// This string form is also the name of the directory derivatives live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SizeSpec {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSizeSpec(pub String);

impl fmt::Display for InvalidSizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected WIDTHxHEIGHT, got {:?}", self.0)
    }
}

impl std::error::Error for InvalidSizeSpec {}

impl FromStr for SizeSpec {
    type Err = InvalidSizeSpec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSizeSpec(s.to_string());
        if !crate::paths::is_size_dir_name(s) {
            return Err(invalid());
        }
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Serialize for SizeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SizeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parameters for the primary rendition: width-capped, never upscaled.
#[derive(Debug, Clone, PartialEq)]
pub struct FitWidthParams<'a> {
    pub source: &'a [u8],
    pub output: PathBuf,
    pub max_width: u32,
    pub quality: Quality,
}

/// Parameters for a derivative: resize to cover, then center-crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverParams<'a> {
    pub source: &'a [u8],
    pub output: PathBuf,
    pub size: SizeSpec,
    pub quality: Quality,
}

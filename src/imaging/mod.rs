//! Image processing: decode, resize, re-encode as WebP.
//!
//! | Rendition | Geometry | Quality |
//! |---|---|---|
//! | **Primary** (`webp/`) | width capped at 2000px, never upscaled | 85 |
//! | **Derivative** (`WIDTHxHEIGHT/`) | cover-fit, exact size | 80 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Where renditions go on disk, combining params + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_fill_dimensions, calculate_fit_width};
pub use operations::{RenditionConfig, create_primary, derivative_path, generate_derivative};
pub use params::{CoverParams, FitWidthParams, InvalidSizeSpec, Quality, SizeSpec};
pub use rust_backend::RustBackend;

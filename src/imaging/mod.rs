//! Image processing: decode, fit, re-encode as JPEG.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Fit within bounds** | [`fit_within`] (pure arithmetic, no upscaling) |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Encode → JPEG data URL** | `JpegEncoder` + `base64` |
//! | **Quality search** | [`quality_search`] (linear descent by 0.1 to a 0.1 floor) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and budget math (unit testable)
//! - **Parameters**: Quality, bounds and per-path options
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    BASE64_OVERHEAD, TargetDimensions, budget_limit, exceeds_budget, fit_within,
};
pub use operations::{
    EncodedImage, SourceImage, compress_image, decode_source, quality_search, render_within,
    resize_image,
};
pub use params::{
    Bounds, CompressOptions, QUALITY_FLOOR, QUALITY_STEP, Quality, ResizeOptions,
};
pub use rust_backend::RustBackend;

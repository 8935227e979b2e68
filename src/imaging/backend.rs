//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four pixel operations the pipeline
//! needs: decode, dimensions, resize, and JPEG encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a recording mock so the quality search can be driven
//! with exact, synthetic encoded sizes.

use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Natural pixel size of a decoded bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// The bitmap type is the backend's own; the pipeline only moves it between
/// calls. `Sync` lets one backend serve parallel pipelines.
pub trait ImageBackend: Sync {
    type Bitmap: Send;

    /// Decode raw file bytes into a bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Bitmap, BackendError>;

    /// Natural dimensions of a decoded bitmap.
    fn dimensions(&self, bitmap: &Self::Bitmap) -> Dimensions;

    /// Draw `bitmap` into a new buffer of exactly `width`×`height`.
    fn resize(
        &self,
        bitmap: &Self::Bitmap,
        width: u32,
        height: u32,
    ) -> Result<Self::Bitmap, BackendError>;

    /// Encode as baseline JPEG at `quality`, returning the raw file bytes.
    fn encode_jpeg(&self, bitmap: &Self::Bitmap, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

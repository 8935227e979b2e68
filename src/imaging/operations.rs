//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Each public
//! entry point runs one pipeline, strictly in order:
//!
//! ```text
//! decode_source → fit_within → backend.resize → quality_search
//! ```

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{TargetDimensions, budget_limit, exceeds_budget, fit_within};
use super::params::{Bounds, CompressOptions, QUALITY_FLOOR, Quality, ResizeOptions};
use crate::data_url::{self, JPEG_MIME};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// A decoded upload, ready for resizing.
#[derive(Debug)]
pub struct SourceImage<T> {
    pub bitmap: T,
    pub dimensions: Dimensions,
    /// Size of the undecoded file.
    pub byte_len: usize,
}

/// Final output of a resize or compress run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    /// Quality of the encoding that was kept.
    pub quality: Quality,
    /// Raw JPEG size before base64.
    pub byte_size: usize,
    pub width: u32,
    pub height: u32,
    /// Number of encodes performed (1 for the plain resize path).
    pub attempts: u32,
    /// Budget the search ran against, if any.
    pub max_size_kb: Option<u32>,
}

impl EncodedImage {
    /// Whether the data URL fits its budget. Always true without one.
    pub fn within_budget(&self) -> bool {
        self.max_size_kb
            .is_none_or(|kb| !exceeds_budget(self.data_url.len(), kb))
    }
}

/// Decode raw file bytes and read the natural dimensions.
pub fn decode_source<B: ImageBackend>(backend: &B, bytes: &[u8]) -> Result<SourceImage<B::Bitmap>> {
    let bitmap = backend.decode(bytes)?;
    let dimensions = backend.dimensions(&bitmap);
    log::debug!(
        "decoded {} bytes → {}x{}",
        bytes.len(),
        dimensions.width,
        dimensions.height
    );
    Ok(SourceImage {
        bitmap,
        dimensions,
        byte_len: bytes.len(),
    })
}

/// Render `source` into a buffer that fits `bounds`.
///
/// Returns the source bitmap untouched when no scaling is needed.
pub fn render_within<B: ImageBackend>(
    backend: &B,
    source: SourceImage<B::Bitmap>,
    bounds: Bounds,
) -> Result<(B::Bitmap, TargetDimensions)> {
    let target = fit_within(source.dimensions.as_tuple(), bounds);
    let (width, height) = target.pixel_size();
    if (width, height) == source.dimensions.as_tuple() {
        log::debug!("{width}x{height} already within {bounds:?}, not scaling");
        return Ok((source.bitmap, target));
    }
    log::debug!(
        "scaling {}x{} → {}x{}",
        source.dimensions.width,
        source.dimensions.height,
        width,
        height
    );
    let resized = backend.resize(&source.bitmap, width, height)?;
    Ok((resized, target))
}

/// Encode `bitmap` as a JPEG data URL, lowering quality by 0.1 per attempt
/// until the URL fits `max_size_kb` or quality reaches 0.1.
///
/// Without a budget exactly one encode happens at `start`. A `start` below
/// the floor is raised to it. Running out of quality is not an error: the
/// floor encoding is returned as-is.
pub fn quality_search<B: ImageBackend>(
    backend: &B,
    bitmap: &B::Bitmap,
    start: Quality,
    max_size_kb: Option<u32>,
) -> Result<EncodedImage> {
    let dims = backend.dimensions(bitmap);
    let mut quality = start.max(QUALITY_FLOOR);
    let mut attempts = 1;
    let mut jpeg = backend.encode_jpeg(bitmap, quality)?;
    log::debug!("attempt 1 at q={quality}: {} bytes", jpeg.len());

    if let Some(kb) = max_size_kb {
        while exceeds_budget(data_url::encoded_len(JPEG_MIME, jpeg.len()), kb) {
            let Some(next) = quality.step_down() else {
                log::warn!(
                    "still over {kb} KB budget at q={quality} ({} > {:.0} chars), keeping it",
                    data_url::encoded_len(JPEG_MIME, jpeg.len()),
                    budget_limit(kb)
                );
                break;
            };
            quality = next;
            attempts += 1;
            jpeg = backend.encode_jpeg(bitmap, quality)?;
            log::debug!("attempt {attempts} at q={quality}: {} bytes", jpeg.len());
        }
    }

    Ok(EncodedImage {
        data_url: data_url::encode_jpeg(&jpeg),
        quality,
        byte_size: jpeg.len(),
        width: dims.width,
        height: dims.height,
        attempts,
        max_size_kb,
    })
}

/// Plain resize: fit within bounds, encode once.
pub fn resize_image<B: ImageBackend>(
    backend: &B,
    bytes: &[u8],
    options: &ResizeOptions,
) -> Result<EncodedImage> {
    let source = decode_source(backend, bytes)?;
    let (bitmap, _) = render_within(backend, source, options.bounds)?;
    let encoded = quality_search(backend, &bitmap, options.quality, None)?;
    log::info!(
        "resized to {}x{} at q={} ({} bytes)",
        encoded.width,
        encoded.height,
        encoded.quality,
        encoded.byte_size
    );
    Ok(encoded)
}

/// Resize plus quality search against `options.max_size_kb`.
pub fn compress_image<B: ImageBackend>(
    backend: &B,
    bytes: &[u8],
    options: &CompressOptions,
) -> Result<EncodedImage> {
    let source = decode_source(backend, bytes)?;
    let (bitmap, _) = render_within(backend, source, options.bounds)?;
    let encoded = quality_search(backend, &bitmap, options.quality, Some(options.max_size_kb))?;
    log::info!(
        "compressed to {}x{} at q={} after {} attempt(s) ({} bytes)",
        encoded.width,
        encoded.height,
        encoded.quality,
        encoded.attempts,
        encoded.byte_size
    );
    Ok(encoded)
}

//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! JPEG has no alpha channel. Transparent pixels are composited onto black,
//! the same result a browser canvas gives when exporting `image/jpeg`.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};

/// Input formats whose decoders are compiled in.
pub const DECODABLE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    filter: FilterType,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop alpha by compositing onto black.
fn flatten_onto_black(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
        image::Rgb([scale(r), scale(g), scale(b)])
    })
}

impl ImageBackend for RustBackend {
    type Bitmap = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        let img = image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(BackendError::Decode(format!(
                "image has no pixels ({}x{})",
                img.width(),
                img.height()
            )));
        }
        Ok(img)
    }

    fn dimensions(&self, bitmap: &DynamicImage) -> Dimensions {
        Dimensions {
            width: bitmap.width(),
            height: bitmap.height(),
        }
    }

    fn resize(
        &self,
        bitmap: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot resize to {width}x{height}"
            )));
        }
        if (width, height) == (bitmap.width(), bitmap.height()) {
            return Ok(bitmap.clone());
        }
        Ok(bitmap.resize_exact(width, height, self.filter))
    }

    fn encode_jpeg(&self, bitmap: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let rgb = flatten_onto_black(bitmap);
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.percent())
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_image, jpeg_bytes, png_bytes, translucent_image};
    use image::{GenericImageView, RgbaImage};

    #[test]
    fn decodable_formats_are_compiled_in() {
        for format in DECODABLE_FORMATS {
            assert!(format.reading_enabled(), "{format:?} decoder missing");
        }
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let backend = RustBackend::new();
        let img = backend.decode(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(backend.dimensions(&img).as_tuple(), (200, 150));
    }

    #[test]
    fn decode_synthetic_png() {
        let backend = RustBackend::new();
        let img = backend.decode(&png_bytes(64, 48)).unwrap();
        assert_eq!(backend.dimensions(&img).as_tuple(), (64, 48));
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        let result = backend.decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_truncated_jpeg_errors() {
        let backend = RustBackend::new();
        let bytes = jpeg_bytes(100, 100);
        let result = backend.decode(&bytes[..bytes.len() / 4]);
        assert!(result.is_err());
    }

    #[test]
    fn resize_exact_dimensions() {
        let backend = RustBackend::new();
        let img = gradient_image(400, 300);
        let resized = backend.resize(&img, 133, 100).unwrap();
        assert_eq!(resized.dimensions(), (133, 100));
    }

    #[test]
    fn resize_to_zero_errors() {
        let backend = RustBackend::new();
        let img = gradient_image(40, 30);
        assert!(backend.resize(&img, 0, 30).is_err());
    }

    #[test]
    fn encode_produces_jpeg() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode_jpeg(&gradient_image(120, 80), Quality::new(80))
            .unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn lower_quality_encodes_smaller() {
        let backend = RustBackend::new();
        let img = gradient_image(320, 240);
        let high = backend.encode_jpeg(&img, Quality::new(95)).unwrap();
        let low = backend.encode_jpeg(&img, Quality::new(10)).unwrap();
        assert!(
            low.len() < high.len(),
            "q10 ({}) should be smaller than q95 ({})",
            low.len(),
            high.len()
        );
    }

    #[test]
    fn transparent_pixels_become_black() {
        let transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([255, 255, 255, 0]),
        ));
        let flat = flatten_onto_black(&transparent);
        assert!(flat.pixels().all(|p| p.0 == [0, 0, 0]));

        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([10, 20, 30, 255]),
        ));
        let flat = flatten_onto_black(&opaque);
        assert!(flat.pixels().all(|p| p.0 == [10, 20, 30]));
    }

    #[test]
    fn translucent_source_encodes_premultiplied() {
        let backend = RustBackend::new();
        let img = translucent_image(8, 8);
        let flat = flatten_onto_black(&img);
        assert!(flat.pixels().all(|p| p.0 == [100, 50, 25]));

        let bytes = backend.encode_jpeg(&img, Quality::new(90)).unwrap();
        let decoded = backend.decode(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }
}

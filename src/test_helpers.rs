//! Shared test utilities: synthetic images encoded in memory.
//!
//! Nothing here touches fixture files. Each helper builds its image from a
//! formula so tests stay deterministic.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let bytes = jpeg_bytes(3000, 2000);
//! let file = SelectedFile::new("stage.jpg", "image/jpeg", bytes);
//! ```

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

/// Smooth RGB gradient. Compresses well.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Pseudo-random RGB noise. Compresses badly, so it pushes the quality
/// search down toward the floor.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

/// Half-transparent RGBA image, for alpha flattening.
pub fn translucent_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 100, 50, 128]),
    ))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A gradient encoded as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Jpeg)
}

/// A gradient encoded as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Png)
}

/// Noise encoded as PNG (lossless, so the file stays large).
pub fn noise_png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&noise_image(width, height), ImageFormat::Png)
}

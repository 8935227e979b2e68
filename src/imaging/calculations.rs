//! Pure calculation functions for image dimensions and size budgets.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Bounds;

/// Approximate ratio of data URL length to raw JPEG length.
///
/// Base64 alone is 4/3; the extra covers the `data:` header loosely. Kept as a
/// fixed constant because it decides how hard the quality search pushes.
pub const BASE64_OVERHEAD: f64 = 1.37;

/// Output dimensions computed by [`fit_within`].
///
/// Kept fractional so the aspect ratio survives exactly; use
/// [`pixel_size`](Self::pixel_size) for the buffer that gets drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDimensions {
    pub width: f64,
    pub height: f64,
}

impl TargetDimensions {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whole-pixel size of the output buffer, never smaller than 1×1.
    pub fn pixel_size(&self) -> (u32, u32) {
        let to_px = |v: f64| (v.round() as u32).max(1);
        (to_px(self.width), to_px(self.height))
    }
}

/// Fit `source` inside `bounds`, preserving aspect ratio and never upscaling.
///
/// Landscape images clamp their width first and derive the height; portrait
/// and square images clamp their height first and derive the width. If the
/// derived edge still overflows its bound (a near-square landscape in a wide
/// box, say) that edge is clamped too and the other re-derived.
///
/// # Examples
/// ```
/// # use tribe_images::imaging::{Bounds, fit_within};
/// // Landscape 3000x2000 into 1200x800 → 1200x800
/// let t = fit_within((3000, 2000), Bounds::new(1200, 800));
/// assert_eq!((t.width, t.height), (1200.0, 800.0));
///
/// // Already small enough → unchanged
/// let t = fit_within((400, 300), Bounds::new(1200, 800));
/// assert_eq!((t.width, t.height), (400.0, 300.0));
/// ```
pub fn fit_within(source: (u32, u32), bounds: Bounds) -> TargetDimensions {
    let width = f64::from(source.0);
    let height = f64::from(source.1);
    let max_width = f64::from(bounds.max_width);
    let max_height = f64::from(bounds.max_height);

    if (width <= max_width && height <= max_height) || width == 0.0 || height == 0.0 {
        return TargetDimensions { width, height };
    }

    let aspect = width / height;
    let (mut out_w, mut out_h) = if aspect > 1.0 {
        // Landscape: width leads
        let w = max_width.min(width);
        (w, w / aspect)
    } else {
        // Portrait or square: height leads
        let h = max_height.min(height);
        (h * aspect, h)
    };

    if out_w > max_width {
        out_w = max_width;
        out_h = out_w / aspect;
    }
    if out_h > max_height {
        out_h = max_height;
        out_w = out_h * aspect;
    }

    TargetDimensions {
        width: out_w,
        height: out_h,
    }
}

/// Maximum data URL length (in characters) allowed for a budget of `max_size_kb`.
pub fn budget_limit(max_size_kb: u32) -> f64 {
    f64::from(max_size_kb) * 1024.0 * BASE64_OVERHEAD
}

/// Whether an encoded data URL of `encoded_len` characters is over budget.
pub fn exceeds_budget(encoded_len: usize, max_size_kb: u32) -> bool {
    encoded_len as f64 > budget_limit(max_size_kb)
}

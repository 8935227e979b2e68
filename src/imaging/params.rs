//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which sequences decode, resize and encode) and the
//! [`backend`](super::backend) (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality factor in whole percent (0.01–1.00, default 0.80).
//! - [`Bounds`]: Bounding box an image must fit inside.
//! - [`ResizeOptions`]: Plain resize: bounds + one encode at a fixed quality.
//! - [`CompressOptions`]: Resize + quality search against a byte budget.

/// Lowest quality the quality search will ever encode at (0.1).
pub const QUALITY_FLOOR: Quality = Quality(10);

/// Amount the quality search lowers quality by on each attempt (0.1).
pub const QUALITY_STEP: u8 = 10;

/// Quality setting for lossy JPEG encoding.
///
/// Stored as whole percent so that stepping down by 0.1 is exact: a search
/// starting at 0.8 visits 0.8, 0.7, ... 0.1 and never drifts below the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Build from whole percent, clamped to 1–100.
    pub fn new(percent: u8) -> Self {
        Self(percent.clamp(1, 100))
    }

    /// Build from a factor in `[0, 1]`, rounded to the nearest percent.
    ///
    /// ```
    /// # use tribe_images::imaging::Quality;
    /// assert_eq!(Quality::from_factor(0.8).percent(), 80);
    /// assert_eq!(Quality::from_factor(7.0).percent(), 100);
    /// ```
    pub fn from_factor(factor: f64) -> Self {
        if !factor.is_finite() {
            return Self::default();
        }
        let percent = (factor * 100.0).round().clamp(1.0, 100.0);
        Self(percent as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn factor(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// The next quality in the descent, or `None` if that would go below the floor.
    pub fn step_down(self) -> Option<Self> {
        let next = self.0.checked_sub(QUALITY_STEP)?;
        (next >= QUALITY_FLOOR.0).then_some(Self(next))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.factor())
    }
}

/// Bounding box an output image must fit inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Bounds {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

/// Parameters for the plain resize path: one encode, no size budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub bounds: Bounds,
    pub quality: Quality,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(800, 600),
            quality: Quality::default(),
        }
    }
}

/// Parameters for the compression path: resize, then search quality until the
/// encoded data URL fits `max_size_kb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    pub bounds: Bounds,
    pub quality: Quality,
    pub max_size_kb: u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(1200, 800),
            quality: Quality::default(),
            max_size_kb: 500,
        }
    }
}

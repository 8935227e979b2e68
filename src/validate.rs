//! Upload validation.
//!
//! The gatekeeper that runs before any decode work. Validation never fails
//! with an `Err`: a rejected file is an ordinary outcome, reported as a
//! [`ValidationResult`] whose `message` is meant to be shown next to the
//! upload control.
//!
//! Rules are checked in order and the first failure wins:
//!
//! 1. no file → `"No file selected."`
//! 2. MIME type outside [`SUPPORTED_MIME_TYPES`] → format message
//! 3. size (MB, two decimals) above the ceiling → size message
//! 4. otherwise → `"Valid image file."`

use crate::upload::{FileInfo, UploadError, UploadFile};
use serde::Serialize;
use std::path::Path;

/// MIME types accepted for upload. Matched exactly and case-sensitively.
pub const SUPPORTED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Default upload ceiling in megabytes.
pub const DEFAULT_MAX_SIZE_MB: f64 = 10.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Outcome of [`validate_image_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: "Valid image file.".to_string(),
        }
    }

    fn invalid(message: String) -> Self {
        Self {
            is_valid: false,
            message,
        }
    }
}

/// File size in megabytes, rounded to two decimals.
pub fn file_size_mb(file: &dyn UploadFile) -> f64 {
    let mb = file.byte_len() as f64 / BYTES_PER_MB;
    (mb * 100.0).round() / 100.0
}

/// Whether the declared MIME type is one of [`SUPPORTED_MIME_TYPES`].
pub fn is_valid_image_type(file: &dyn UploadFile) -> bool {
    SUPPORTED_MIME_TYPES.contains(&file.mime_type())
}

/// Check a candidate upload against the type allowlist and `max_size_mb`.
///
/// ```
/// # use tribe_images::upload::FileInfo;
/// # use tribe_images::validate::validate_image_file;
/// let bmp = FileInfo::new("image/bmp", 1024);
/// let result = validate_image_file(Some(&bmp), 10.0);
/// assert!(!result.is_valid);
/// ```
pub fn validate_image_file(file: Option<&dyn UploadFile>, max_size_mb: f64) -> ValidationResult {
    let Some(file) = file else {
        return ValidationResult::invalid("No file selected.".to_string());
    };

    if !is_valid_image_type(file) {
        return ValidationResult::invalid(format!(
            "File format not supported. Only supports JPEG, PNG, GIF, and WebP images up to {max_size_mb}MB."
        ));
    }

    let size_mb = file_size_mb(file);
    if size_mb > max_size_mb {
        return ValidationResult::invalid(format!(
            "File too large ({size_mb:.2}MB). Only supports files up to {max_size_mb}MB."
        ));
    }

    ValidationResult::valid()
}

/// Validate a file on disk from its metadata, without reading it.
///
/// Only a file that cannot be stat'ed is an `Err`; anything else, including
/// an unrecognised extension, gets a verdict.
pub fn validate_path(path: &Path, max_size_mb: f64) -> Result<ValidationResult, UploadError> {
    let info = FileInfo::declared(path)?;
    Ok(validate_image_file(Some(&info), max_size_mb))
}

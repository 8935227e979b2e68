//! CLI output formatting.
//!
//! Every file an upload command touches gets a header line (positional index
//! + file name) followed by indented context lines: where it came from and
//! what happened to it.
//!
//! # Output Format
//!
//! ## Validate
//!
//! ```text
//! 001 poster.png: valid
//!     Valid image file.
//! 002 flyer.bmp: invalid
//!     File format not supported. Only supports JPEG, PNG, GIF, and WebP images up to 10MB.
//! ```
//!
//! ## Resize / Compress
//!
//! ```text
//! 001 stage.jpg
//!     Source: photos/stage.jpg
//!     1200x800 JPEG, q=0.60, 412.7 KB after 3 attempts
//! 002 flyer.bmp
//!     Rejected: File format not supported. Only supports JPEG, PNG, GIF, and WebP images up to 10MB.
//!
//! Encoded 1 of 2 files (1 rejected, 0 failed)
//! ```
//!
//! ## Inspect
//!
//! ```text
//! out/stage.dataurl
//!     MIME: image/jpeg
//!     Payload: 422608 bytes (563503 chars as data URL)
//!     Pixels: 1200x800
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::Dimensions;
use crate::process::{FileOutcome, ProcessError, ProcessEvent};
use crate::validate::ValidationResult;
use serde::Serialize;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// File name of a path, falling back to the whole path.
fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Byte count as KB with one decimal.
fn format_kb(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

// ============================================================================
// validate
// ============================================================================

/// Format one validator verdict.
pub fn format_validation(index: usize, path: &Path, result: &ValidationResult) -> Vec<String> {
    let verdict = if result.is_valid { "valid" } else { "invalid" };
    vec![
        format!(
            "{} {}: {}",
            format_index(index),
            display_name(&path.display().to_string()),
            verdict
        ),
        format!("    {}", result.message),
    ]
}

pub fn print_validation(index: usize, path: &Path, result: &ValidationResult) {
    for line in format_validation(index, path, result) {
        println!("{}", line);
    }
}

/// Format a file that could not be checked at all (missing, unreadable).
pub fn format_validation_error(index: usize, path: &Path, error: &str) -> Vec<String> {
    vec![
        format!(
            "{} {}: error",
            format_index(index),
            display_name(&path.display().to_string())
        ),
        format!("    {}", error),
    ]
}

pub fn print_validation_error(index: usize, path: &Path, error: &str) {
    for line in format_validation_error(index, path, error) {
        println!("{}", line);
    }
}

/// One `validate --json` line: the verdict, or why there is none.
#[derive(Debug, Serialize)]
pub struct ValidationReport<'a> {
    pub path: String,
    #[serde(flatten)]
    pub result: Option<&'a ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> ValidationReport<'a> {
    pub fn new(path: &Path, outcome: Result<&'a ValidationResult, &'a str>) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            path: path.display().to_string(),
            result,
            error,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ============================================================================
// resize / compress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Encoded {
            index,
            path,
            width,
            height,
            quality,
            byte_size,
            attempts,
            within_budget,
        } => {
            let attempts = match *attempts {
                1 => "1 attempt".to_string(),
                n => format!("{n} attempts"),
            };
            let mut lines = vec![
                format!("{} {}", format_index(index + 1), display_name(path)),
                format!("    Source: {}", path),
                format!(
                    "    {}x{} JPEG, q={:.2}, {} after {}",
                    width,
                    height,
                    quality,
                    format_kb(*byte_size),
                    attempts
                ),
            ];
            if !*within_budget {
                lines.push("    Over budget at the lowest quality, kept anyway".to_string());
            }
            lines
        }
        ProcessEvent::Rejected {
            index,
            path,
            message,
        } => vec![
            format!("{} {}", format_index(index + 1), display_name(path)),
            format!("    Rejected: {}", message),
        ],
        ProcessEvent::Failed { index, path, error } => vec![
            format!("{} {}", format_index(index + 1), display_name(path)),
            format!("    Failed: {}", error),
        ],
    }
}

/// One-line tally of a finished batch.
pub fn format_batch_summary(outcomes: &[FileOutcome]) -> Vec<String> {
    let encoded = outcomes.iter().filter(|o| o.result.is_ok()).count();
    let rejected = outcomes
        .iter()
        .filter(|o| matches!(o.result, Err(ProcessError::Rejected(_))))
        .count();
    let failed = outcomes.len() - encoded - rejected;
    vec![
        String::new(),
        format!(
            "Encoded {} of {} files ({} rejected, {} failed)",
            encoded,
            outcomes.len(),
            rejected,
            failed
        ),
    ]
}

// ============================================================================
// inspect
// ============================================================================

/// Format what a data URL holds.
///
/// `pixels` is `None` when the payload does not decode as an image.
pub fn format_inspection(
    source: &Path,
    mime_type: &str,
    payload_len: usize,
    url_len: usize,
    pixels: Option<Dimensions>,
) -> Vec<String> {
    let pixels = match pixels {
        Some(d) => format!("{}x{}", d.width, d.height),
        None => "not decodable".to_string(),
    };
    vec![
        source.display().to_string(),
        format!("    MIME: {}", mime_type),
        format!(
            "    Payload: {} bytes ({} chars as data URL)",
            payload_len, url_len
        ),
        format!("    Pixels: {}", pixels),
    ]
}

pub fn print_inspection(
    source: &Path,
    mime_type: &str,
    payload_len: usize,
    url_len: usize,
    pixels: Option<Dimensions>,
) {
    for line in format_inspection(source, mime_type, payload_len, url_len, pixels) {
        println!("{}", line);
    }
}

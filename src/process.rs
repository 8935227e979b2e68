//! Validated upload pipelines: single file, async with timeout, and batch.
//!
//! Everything here is the full Validate → Decode → Resize → Quality Search
//! sequence. A file that fails validation never reaches the decoder; its
//! validator message comes back as [`ProcessError::Rejected`].
//!
//! ## Entry points
//!
//! | Function | Use |
//! |---|---|
//! | [`compress_file`] / [`resize_file`] | one in-memory upload, blocking |
//! | [`compress_file_async`] / [`resize_file_async`] | same, awaited on tokio's blocking pool with a timeout |
//! | [`process_files`] | many files from disk, in parallel on rayon, with progress events |
//!
//! ## Timeouts
//!
//! The async entry points await the blocking pipeline as their only
//! suspension point, bounded by a timeout. When it fires the caller gets
//! [`ProcessError::Timeout`] immediately; the abandoned decode finishes on
//! its worker thread and its result is dropped. Dropping the future early
//! has the same effect.

use crate::config::UploadConfig;
use crate::imaging::{
    BackendError, CompressOptions, EncodedImage, ImageBackend, ResizeOptions, compress_image,
    resize_image,
};
use crate::upload::{FileInfo, SelectedFile, UploadError, UploadFile};
use crate::validate::validate_image_file;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("{0}")]
    Rejected(String),
    #[error("Processing timed out after {0:?}")]
    Timeout(Duration),
    #[error("Processing task failed: {0}")]
    Join(String),
}

/// Which pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fit within bounds, encode once.
    Resize,
    /// Fit within bounds, then search quality against the size budget.
    Compress,
}

impl Mode {
    fn run<B: ImageBackend>(
        self,
        backend: &B,
        bytes: &[u8],
        config: &UploadConfig,
    ) -> Result<EncodedImage, ProcessError> {
        let encoded = match self {
            Self::Resize => resize_image(backend, bytes, &config.resize.to_options())?,
            Self::Compress => compress_image(backend, bytes, &config.compress.to_options())?,
        };
        Ok(encoded)
    }
}

fn ensure_valid(file: &dyn UploadFile, max_size_mb: f64) -> Result<(), ProcessError> {
    let verdict = validate_image_file(Some(file), max_size_mb);
    if verdict.is_valid {
        Ok(())
    } else {
        log::debug!("rejected upload: {}", verdict.message);
        Err(ProcessError::Rejected(verdict.message))
    }
}

/// Validate, then resize + quality search.
pub fn compress_file<B: ImageBackend>(
    backend: &B,
    file: &SelectedFile,
    max_size_mb: f64,
    options: &CompressOptions,
) -> Result<EncodedImage, ProcessError> {
    ensure_valid(file, max_size_mb)?;
    Ok(compress_image(backend, &file.bytes, options)?)
}

/// Validate, then plain resize.
pub fn resize_file<B: ImageBackend>(
    backend: &B,
    file: &SelectedFile,
    max_size_mb: f64,
    options: &ResizeOptions,
) -> Result<EncodedImage, ProcessError> {
    ensure_valid(file, max_size_mb)?;
    Ok(resize_image(backend, &file.bytes, options)?)
}

/// Run a blocking job on tokio's blocking pool, giving up after `timeout`.
async fn run_blocking<T, F>(timeout: Duration, job: F) -> Result<T, ProcessError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProcessError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ProcessError::Join(join_err.to_string())),
        Err(_) => {
            log::warn!("pipeline abandoned after {timeout:?}");
            Err(ProcessError::Timeout(timeout))
        }
    }
}

/// [`compress_file`] for async callers, bounded by `timeout`.
///
/// Validation runs inline before anything is spawned.
pub async fn compress_file_async<B>(
    backend: Arc<B>,
    file: SelectedFile,
    max_size_mb: f64,
    options: CompressOptions,
    timeout: Duration,
) -> Result<EncodedImage, ProcessError>
where
    B: ImageBackend + Send + 'static,
{
    ensure_valid(&file, max_size_mb)?;
    run_blocking(timeout, move || {
        Ok(compress_image(backend.as_ref(), &file.bytes, &options)?)
    })
    .await
}

/// [`resize_file`] for async callers, bounded by `timeout`.
pub async fn resize_file_async<B>(
    backend: Arc<B>,
    file: SelectedFile,
    max_size_mb: f64,
    options: ResizeOptions,
    timeout: Duration,
) -> Result<EncodedImage, ProcessError>
where
    B: ImageBackend + Send + 'static,
{
    ensure_valid(&file, max_size_mb)?;
    run_blocking(timeout, move || {
        Ok(resize_image(backend.as_ref(), &file.bytes, &options)?)
    })
    .await
}

// =============================================================================
// Batch processing
// =============================================================================

/// Progress event emitted once per file by [`process_files`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessEvent {
    Encoded {
        index: usize,
        path: String,
        width: u32,
        height: u32,
        quality: f64,
        byte_size: usize,
        attempts: u32,
        within_budget: bool,
    },
    Rejected {
        index: usize,
        path: String,
        message: String,
    },
    Failed {
        index: usize,
        path: String,
        error: String,
    },
}

impl ProcessEvent {
    fn from_result(index: usize, path: &Path, result: &Result<EncodedImage, ProcessError>) -> Self {
        let path = path.display().to_string();
        match result {
            Ok(encoded) => Self::Encoded {
                index,
                path,
                width: encoded.width,
                height: encoded.height,
                quality: encoded.quality.factor(),
                byte_size: encoded.byte_size,
                attempts: encoded.attempts,
                within_budget: encoded.within_budget(),
            },
            Err(ProcessError::Rejected(message)) => Self::Rejected {
                index,
                path,
                message: message.clone(),
            },
            Err(e) => Self::Failed {
                index,
                path,
                error: e.to_string(),
            },
        }
    }
}

/// Result for one input of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<EncodedImage, ProcessError>,
}

/// Validate and process one file from disk.
///
/// The size check uses file metadata, so an oversized upload is rejected
/// without being read.
pub fn process_path<B: ImageBackend>(
    backend: &B,
    path: &Path,
    mode: Mode,
    config: &UploadConfig,
) -> Result<EncodedImage, ProcessError> {
    let info = FileInfo::from_path(path)?;
    ensure_valid(&info, config.validation.max_size_mb)?;
    let file = SelectedFile::from_path(path)?;
    mode.run(backend, &file.bytes, config)
}

/// Process every path in parallel. Outcomes come back in input order.
///
/// Each file is an independent pipeline; one failure does not stop the
/// others. If `events` is given, one [`ProcessEvent`] is sent per file as it
/// finishes (so events arrive in completion order, not input order).
pub fn process_files<B: ImageBackend>(
    backend: &B,
    paths: &[PathBuf],
    mode: Mode,
    config: &UploadConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Vec<FileOutcome> {
    paths
        .par_iter()
        .enumerate()
        .map_with(events, |events, (index, path)| {
            let result = process_path(backend, path, mode, config);
            if let Some(tx) = events {
                // A dropped receiver only means nobody is listening.
                let _ = tx.send(ProcessEvent::from_result(index, path, &result));
            }
            FileOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

//! # Tribe Images
//!
//! The image-upload core behind Event Tribe's event and profile forms. A user
//! picks a photo; before anything leaves the machine it is checked, shrunk to
//! fit a bounding box and re-encoded as JPEG until it fits a size budget. The
//! result is a `data:image/jpeg;base64,...` string ready to embed in a JSON
//! form payload.
//!
//! # Architecture: One Pipeline, Four Steps
//!
//! ```text
//! 1. Validate   file      →  ValidationResult   (MIME allowlist + size ceiling)
//! 2. Decode     bytes     →  bitmap + size      (natural dimensions)
//! 3. Resize     bitmap    →  bitmap             (fit within bounds, never upscale)
//! 4. Search     bitmap    →  data URL           (lower JPEG quality until it fits)
//! ```
//!
//! Steps run strictly in order and each step's output is the next one's
//! input. Validation is the gate: nothing is decoded for a file it rejects.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Step 1: MIME allowlist and size ceiling, user-facing messages |
//! | [`imaging`] | Steps 2–4: backend trait, dimension math, quality search |
//! | [`data_url`] | `data:` URL encoding and parsing |
//! | [`upload`] | The selected file: name, declared MIME type, bytes |
//! | [`process`] | Validated pipelines: blocking, async with timeout, parallel batch |
//! | [`config`] | `tribe-images.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Bounded Linear Quality Descent
//!
//! Quality drops by 0.1 per attempt from the starting value and stops at 0.1.
//! That is at most ten encodes, each cheap at the post-resize size. A binary
//! search would save a few encodes but makes the chosen quality harder to
//! predict, and the floor keeps a tiny budget from looping forever.
//!
//! ## Budget Measured on the Data URL
//!
//! The size budget applies to the data URL string, not the JPEG bytes. The
//! limit is `max_size_kb × 1024 × 1.37`: base64 costs roughly 4/3 and the
//! extra margin covers the URL prefix. Callers never see a budget that the
//! raw file meets but the payload does not.
//!
//! ## No Upscaling
//!
//! Images already inside the bounding box keep their natural size. Only the
//! JPEG re-encode happens, so a small PNG still comes out as a JPEG.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decode, Lanczos3
//! resampling and JPEG encoding. No system libraries, no external processes.
//! The [`imaging::ImageBackend`] trait keeps the pipeline testable with a
//! recording mock.

pub mod config;
pub mod data_url;
pub mod imaging;
pub mod output;
pub mod process;
pub mod upload;
pub mod validate;

pub use imaging::{EncodedImage, RustBackend, compress_image, resize_image};
pub use process::{ProcessError, compress_file, resize_file};
pub use upload::SelectedFile;
pub use validate::{ValidationResult, validate_image_file};

#[cfg(test)]
pub(crate) mod test_helpers;

//! `data:` URL encoding and parsing.
//!
//! Every image this crate produces is handed back as
//! `data:image/jpeg;base64,<payload>` so callers can drop it straight into a
//! JSON form payload. [`parse`] reverses that for inspection and tests.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// MIME type of every image this crate outputs.
pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("not a data URL (missing `data:` prefix)")]
    MissingScheme,
    #[error("data URL has no `,` separating header and payload")]
    MissingPayload,
    #[error("only base64 data URLs are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A parsed data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Encode `bytes` as a base64 data URL of the given MIME type.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    let prefix = format!("data:{mime_type};base64,");
    let mut out = String::with_capacity(encoded_len(mime_type, bytes.len()));
    out.push_str(&prefix);
    STANDARD.encode_string(bytes, &mut out);
    out
}

/// Encode JPEG bytes as a data URL.
pub fn encode_jpeg(bytes: &[u8]) -> String {
    encode(JPEG_MIME, bytes)
}

/// Exact length of [`encode`]'s output without building it.
pub fn encoded_len(mime_type: &str, byte_len: usize) -> usize {
    "data:".len() + mime_type.len() + ";base64,".len() + byte_len.div_ceil(3) * 4
}

/// Parse a base64 data URL back into its MIME type and raw bytes.
///
/// Surrounding whitespace is ignored, so a `.dataurl` file with a trailing
/// newline parses cleanly.
pub fn parse(input: &str) -> Result<DataUrl, DataUrlError> {
    let rest = input
        .trim()
        .strip_prefix("data:")
        .ok_or(DataUrlError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;
    let bytes = STANDARD.decode(payload)?;
    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

//! The "selected file" handed to the pipeline.
//!
//! A browser gives an upload handler a blob with a declared MIME type and a
//! byte size; [`SelectedFile`] is the owned equivalent. The MIME type is
//! declared, not sniffed: it comes from the file extension (as a browser
//! derives it) or from the caller, and the decoder is what finds out whether
//! the bytes agree.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot infer MIME type for {0}")]
    UnknownExtension(PathBuf),
}

/// What the validator needs to know about an upload.
pub trait UploadFile {
    /// Declared MIME type, e.g. `image/png`.
    fn mime_type(&self) -> &str;
    /// Size of the file in bytes.
    fn byte_len(&self) -> u64;
}

/// Extension → declared MIME type, the way browsers map common image files.
const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

/// Declared MIME type for a path, based on its extension (case-insensitive).
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Whether `path` looks like an image file worth picking up from a directory.
pub fn is_image_path(path: &Path) -> bool {
    mime_type_for_path(path).is_some()
}

/// An upload held in memory: name, declared MIME type and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let mime = mime_type_for_path(path)
            .ok_or_else(|| UploadError::UnknownExtension(path.to_path_buf()))?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime, bytes))
    }

    /// Replace the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

impl UploadFile for SelectedFile {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Metadata-only upload description, for validating before reading content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub mime_type: String,
    pub byte_len: u64,
}

impl FileInfo {
    pub fn new(mime_type: impl Into<String>, byte_len: u64) -> Self {
        Self {
            mime_type: mime_type.into(),
            byte_len,
        }
    }

    /// Stat a file on disk without reading it.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let mime = mime_type_for_path(path)
            .ok_or_else(|| UploadError::UnknownExtension(path.to_path_buf()))?;
        let len = std::fs::metadata(path)?.len();
        Ok(Self::new(mime, len))
    }

    /// Stat a file the way a browser file picker reports it: an unrecognised
    /// extension declares an empty MIME type instead of failing.
    pub fn declared(path: &Path) -> Result<Self, UploadError> {
        let len = std::fs::metadata(path)?.len();
        Ok(Self::new(mime_type_for_path(path).unwrap_or(""), len))
    }
}

impl UploadFile for FileInfo {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn byte_len(&self) -> u64 {
        self.byte_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_type_for_path(Path::new("a/b.JPG")), Some("image/jpeg"));
        assert_eq!(mime_type_for_path(Path::new("x.webp")), Some("image/webp"));
        assert_eq!(mime_type_for_path(Path::new("x.bmp")), Some("image/bmp"));
        assert_eq!(mime_type_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_type_for_path(Path::new("no_extension")), None);
    }

    #[test]
    fn selected_file_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("poster.png");
        std::fs::write(&path, [1, 2, 3, 4]).unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "poster.png");
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.byte_len(), 4);
    }

    #[test]
    fn selected_file_unknown_extension_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("poster.txt");
        std::fs::write(&path, "hi").unwrap();

        assert!(matches!(
            SelectedFile::from_path(&path),
            Err(UploadError::UnknownExtension(_))
        ));
    }

    #[test]
    fn selected_file_missing_errors() {
        let result = SelectedFile::from_path(Path::new("/nonexistent/poster.jpg"));
        assert!(matches!(result, Err(UploadError::Io(_))));
    }

    #[test]
    fn with_mime_type_overrides_declared_type() {
        let file = SelectedFile::new("x.jpg", "image/jpeg", vec![]).with_mime_type("image/png");
        assert_eq!(file.mime_type(), "image/png");
    }

    #[test]
    fn file_info_stats_without_reading() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("banner.gif");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let info = FileInfo::from_path(&path).unwrap();
        assert_eq!(info, FileInfo::new("image/gif", 2048));
    }

    #[test]
    fn declared_info_tolerates_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        assert_eq!(FileInfo::declared(&path).unwrap(), FileInfo::new("", 5));
        assert!(matches!(
            FileInfo::declared(&tmp.path().join("missing.png")),
            Err(UploadError::Io(_))
        ));
    }
}

//! Submitted document (image or PDF of sheet music)

use sha2::{Digest, Sha256};
use std::path::Path;

/// A byte-accessible input document
///
/// Acquisition (file picker, upload, size/MIME checks) happens outside the
/// controller; the controller only needs the bytes and a name to derive hints
/// from.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original file name as supplied by the caller
    pub file_name: String,
    /// Raw document bytes
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without directory or extension ("score" for "scans/score.pdf")
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("sheet_music")
    }

    /// Lowercase hex SHA-256 of the document bytes
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    /// MIME type sniffed from magic bytes, if recognizable
    pub fn sniff_mime_type(&self) -> Option<&'static str> {
        infer::get(&self.bytes).map(|kind| kind.mime_type())
    }
}

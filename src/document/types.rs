//! Uploaded document types
//!
//! The upload boundary hands over raw bytes plus a declared media type.
//! Only JPEG, PNG and PDF are accepted.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// Accepted media types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Pdf,
}

impl MediaType {
    /// Parse a declared MIME type
    ///
    /// Matching is case-insensitive and ignores parameters such as
    /// `; charset=binary`.
    pub fn from_mime(mime: &str) -> Result<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "application/pdf" => Ok(Self::Pdf),
            _ => Err(ExtractError::UnsupportedMediaType(mime.to_string())),
        }
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        None
    }

    /// Canonical MIME string
    pub fn as_mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_pdf(self) -> bool {
        self == Self::Pdf
    }
}

/// An uploaded artifact
///
/// Immutable once received; consumed by one extraction request.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: MediaType,
}

impl Document {
    /// Create a document from raw bytes and the declared MIME type
    ///
    /// Fails with `UnsupportedMediaType` before any content is inspected.
    pub fn new(bytes: Vec<u8>, declared_mime: &str) -> Result<Self> {
        let media_type = MediaType::from_mime(declared_mime)?;
        Ok(Self::with_media_type(bytes, media_type))
    }

    pub fn with_media_type(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

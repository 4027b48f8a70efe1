//! Export packager
//!
//! Serialises the final text blob for download, either verbatim or wrapped
//! in a one-key JSON object.

use std::fmt;
use std::str::FromStr;

use crate::error::ExtractError;

/// Download encoding, chosen independently of the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    PlainText,
    JsonEnvelope,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::PlainText, ExportFormat::JsonEnvelope];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::JsonEnvelope => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::JsonEnvelope => "application/json",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            Self::PlainText => "extracted_text.txt",
            Self::JsonEnvelope => "extracted_text.json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" | "text file" | "plaintext" => Ok(Self::PlainText),
            "json" | "json file" | "jsonenvelope" => Ok(Self::JsonEnvelope),
            _ => Err(ExtractError::UnsupportedExportFormat(s.to_string())),
        }
    }
}

/// A packaged download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub payload: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: &'static str,
}

/// Package extracted text for delivery
///
/// Pure function of its inputs. The JSON envelope keeps non-ASCII text as
/// UTF-8 rather than `\u` escapes.
pub fn package(text: &str, format: ExportFormat) -> Package {
    let payload = match format {
        ExportFormat::PlainText => text.as_bytes().to_vec(),
        ExportFormat::JsonEnvelope => {
            let value = serde_json::Value::from(text);
            format!("{{\"extracted_text\": {}}}", value).into_bytes()
        }
    };

    tracing::debug!("Packaged {} bytes as {}", payload.len(), format);

    Package {
        payload,
        mime_type: format.mime_type(),
        filename: format.filename(),
    }
}

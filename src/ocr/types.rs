//! OCR Types
//!
//! Backend selection and engine output shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// OCR backend selection
///
/// A closed set: anything that does not parse into one of these variants is
/// rejected with `UnsupportedBackend` at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Engine A: Tesseract, stateless and fast, no setup
    Tesseract,
    /// Engine B: ocrs neural models, loaded once per process
    Ocrs,
}

impl OcrBackend {
    pub const ALL: [OcrBackend; 2] = [OcrBackend::Tesseract, OcrBackend::Ocrs];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Ocrs => "ocrs",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Tesseract => "Tesseract (fast, no setup)",
            Self::Ocrs => "ocrs (neural, loads models on first use)",
        }
    }

    /// Whether the engine was compiled into this build
    pub fn is_compiled(self) -> bool {
        match self {
            Self::Tesseract => cfg!(feature = "engine-tesseract"),
            Self::Ocrs => cfg!(feature = "engine-ocrs"),
        }
    }
}

impl fmt::Display for OcrBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcrBackend {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" | "pytesseract" | "engine-a" | "enginea" => Ok(Self::Tesseract),
            "ocrs" | "easyocr" | "engine-b" | "engineb" => Ok(Self::Ocrs),
            _ => Err(ExtractError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Axis-aligned box in raster pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// One detected text region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDetection {
    pub region: BoundingBox,
    pub text: String,
    /// Engine confidence in 0..=1, when the engine reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TextDetection {
    pub fn new(region: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            region,
            text: text.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Raw engine output for one image
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutput {
    /// Engine produced the page text directly
    Text(String),
    /// Engine produced regions in detection order
    Detections(Vec<TextDetection>),
}

impl OcrOutput {
    /// Collapse to a single string
    ///
    /// Detections keep only their text, joined with one space in detection
    /// order. Direct text is returned verbatim.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Detections(detections) => detections
                .into_iter()
                .map(|d| d.text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

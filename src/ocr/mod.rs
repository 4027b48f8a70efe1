//! OCR Module
//!
//! Two interchangeable engines behind one interface:
//! - Tesseract (engine A): stateless, no setup
//! - ocrs (engine B): neural detection + recognition, models loaded once
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_master::ocr::{LazyEngine, OcrAdapter, OcrBackend, OcrsEngine, OcrsModelPaths};
//!
//! let models = OcrsModelPaths::new("models/text-detection.rten", "models/text-recognition.rten");
//! let ocrs = LazyEngine::new("ocrs", move || Ok(Box::new(OcrsEngine::load(&models)?) as _));
//!
//! let adapter = OcrAdapter::new(None, &ocrs);
//! let text = adapter.recognize(&raster, OcrBackend::Ocrs)?;
//! ```

mod adapter;
mod model;
mod provider;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{OcrAdapter, Recognizer};
pub use model::LazyEngine;
pub use provider::{OcrEngine, OcrsEngine, OcrsModelPaths, TesseractEngine};
pub use types::{BoundingBox, OcrBackend, OcrOutput, TextDetection};

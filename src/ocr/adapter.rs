//! OCR backend adapter
//!
//! Dispatches a backend selection to its engine and normalises every
//! engine's output to a single string.

use crate::error::{ExtractError, Result};
use crate::raster::RasterImage;

use super::model::LazyEngine;
use super::provider::OcrEngine;
use super::types::OcrBackend;

/// Uniform entry point over both engines
///
/// Borrows the engines for the duration of one request. The lazily loaded
/// engine stays owned by the caller.
#[derive(Clone, Copy)]
pub struct OcrAdapter<'a> {
    tesseract: Option<&'a dyn OcrEngine>,
    ocrs: &'a LazyEngine,
}

impl<'a> OcrAdapter<'a> {
    pub fn new(tesseract: Option<&'a dyn OcrEngine>, ocrs: &'a LazyEngine) -> Self {
        Self { tesseract, ocrs }
    }

    /// Select the engine for a backend
    ///
    /// For `Ocrs` this triggers the one-time model load. Call it once per
    /// document, outside the page loop.
    pub fn resolve(&self, backend: OcrBackend) -> Result<Recognizer<'a>> {
        let engine = match backend {
            OcrBackend::Tesseract => self.tesseract.ok_or_else(|| {
                ExtractError::EngineUnavailable("tesseract engine is not configured".to_string())
            })?,
            OcrBackend::Ocrs => self.ocrs.get()?,
        };
        Ok(Recognizer { backend, engine })
    }

    /// Recognize a single image with the given backend
    pub fn recognize(&self, image: &RasterImage, backend: OcrBackend) -> Result<String> {
        self.resolve(backend)?.recognize(image)
    }

    /// Whether the backend's engine is ready without further loading
    pub fn is_ready(&self, backend: OcrBackend) -> bool {
        match backend {
            OcrBackend::Tesseract => self.tesseract.is_some(),
            OcrBackend::Ocrs => self.ocrs.is_loaded(),
        }
    }
}

/// An engine resolved for one backend
#[derive(Clone, Copy)]
pub struct Recognizer<'a> {
    backend: OcrBackend,
    engine: &'a dyn OcrEngine,
}

impl Recognizer<'_> {
    /// Recognize one image
    ///
    /// Returns an empty string if nothing was recognized. Errors carry no
    /// partial text.
    pub fn recognize(&self, image: &RasterImage) -> Result<String> {
        if image.is_empty() {
            return Err(ExtractError::RecognitionFailed(format!(
                "{} received a zero-area image ({}x{})",
                self.backend,
                image.width(),
                image.height()
            )));
        }

        let output = self.engine.recognize(image)?;
        Ok(output.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::{solid_raster, MockEngine};
    use crate::ocr::types::{BoundingBox, OcrOutput, TextDetection};

    fn unloadable() -> LazyEngine {
        LazyEngine::new("ocrs", || {
            Err(ExtractError::EngineUnavailable("no models".into()))
        })
    }

    #[test]
    fn test_dispatches_to_tesseract() {
        let tesseract = MockEngine::text(OcrBackend::Tesseract, "from tesseract");
        let ocrs = unloadable();
        let adapter = OcrAdapter::new(Some(&tesseract), &ocrs);

        let text = adapter
            .recognize(&solid_raster(4, 4, 0), OcrBackend::Tesseract)
            .unwrap();
        assert_eq!(text, "from tesseract");
        assert_eq!(tesseract.calls(), 1);
        assert!(!ocrs.is_loaded());
    }

    #[test]
    fn test_dispatches_to_lazy_engine_and_joins_detections() {
        let ocrs = LazyEngine::new("ocrs", || {
            let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
            Ok(Box::new(MockEngine::outputs(
                OcrBackend::Ocrs,
                vec![OcrOutput::Detections(vec![
                    TextDetection::new(bbox, "first").with_confidence(0.8),
                    TextDetection::new(bbox, "second").with_confidence(0.4),
                ])],
            )) as Box<dyn OcrEngine>)
        });
        let adapter = OcrAdapter::new(None, &ocrs);

        assert!(!adapter.is_ready(OcrBackend::Ocrs));
        let text = adapter
            .recognize(&solid_raster(4, 4, 0), OcrBackend::Ocrs)
            .unwrap();
        assert_eq!(text, "first second");
        assert!(adapter.is_ready(OcrBackend::Ocrs));
    }

    #[test]
    fn test_missing_tesseract_is_unavailable() {
        let ocrs = unloadable();
        let adapter = OcrAdapter::new(None, &ocrs);
        assert!(matches!(
            adapter.recognize(&solid_raster(1, 1, 0), OcrBackend::Tesseract),
            Err(ExtractError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn test_engine_failure_is_recognition_failed() {
        let tesseract = MockEngine::failing_after(OcrBackend::Tesseract, 0, "corrupt buffer");
        let ocrs = unloadable();
        let adapter = OcrAdapter::new(Some(&tesseract), &ocrs);

        match adapter.recognize(&solid_raster(2, 2, 0), OcrBackend::Tesseract) {
            Err(ExtractError::RecognitionFailed(msg)) => assert_eq!(msg, "corrupt buffer"),
            other => panic!("expected RecognitionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_area_image_rejected_before_engine() {
        let tesseract = MockEngine::text(OcrBackend::Tesseract, "never");
        let ocrs = unloadable();
        let adapter = OcrAdapter::new(Some(&tesseract), &ocrs);
        let empty = RasterImage::from_rgb(0, 0, Vec::new()).unwrap();

        assert!(matches!(
            adapter.recognize(&empty, OcrBackend::Tesseract),
            Err(ExtractError::RecognitionFailed(_))
        ));
        assert_eq!(tesseract.calls(), 0);
    }

    #[test]
    fn test_recognize_is_idempotent_for_deterministic_engine() {
        let tesseract = MockEngine::echo(OcrBackend::Tesseract);
        let ocrs = unloadable();
        let adapter = OcrAdapter::new(Some(&tesseract), &ocrs);
        let image = solid_raster(3, 2, 7);

        let first = adapter.recognize(&image, OcrBackend::Tesseract).unwrap();
        let second = adapter.recognize(&image, OcrBackend::Tesseract).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "3x2:7");
    }

    #[test]
    fn test_empty_output_is_empty_string() {
        let tesseract = MockEngine::text(OcrBackend::Tesseract, "");
        let ocrs = unloadable();
        let adapter = OcrAdapter::new(Some(&tesseract), &ocrs);
        assert_eq!(
            adapter
                .recognize(&solid_raster(1, 1, 0), OcrBackend::Tesseract)
                .unwrap(),
            ""
        );
    }
}

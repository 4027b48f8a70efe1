//! Extraction orchestrator
//!
//! Turns a document into a sequence of rasters, runs the selected engine
//! over each one in page order and concatenates the results.

use serde::Serialize;

use crate::document::Document;
use crate::error::{ExtractError, Result};
use crate::ocr::{OcrAdapter, OcrBackend};
use crate::raster::{decode_image, PageStream, RasterImage, Rasterizer};

/// Text recognized from a document, one fragment per page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    fragments: Vec<String>,
}

impl ExtractedText {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    /// Fragments in page order
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Every fragment followed by a newline, page 0 first
    pub fn text(&self) -> String {
        let capacity = self.fragments.iter().map(|f| f.len() + 1).sum();
        let mut text = String::with_capacity(capacity);
        for fragment in &self.fragments {
            text.push_str(fragment);
            text.push('\n');
        }
        text
    }
}

/// Extraction orchestrator
///
/// Strictly sequential: page N is recognized and appended before page N+1
/// is rendered. The first failure aborts the run.
pub struct Extractor<'a> {
    rasterizer: &'a dyn Rasterizer,
    ocr: OcrAdapter<'a>,
}

impl<'a> Extractor<'a> {
    pub fn new(rasterizer: &'a dyn Rasterizer, ocr: OcrAdapter<'a>) -> Self {
        Self { rasterizer, ocr }
    }

    /// Extract all text from a document with the selected backend
    pub fn extract(&self, document: &Document, backend: OcrBackend) -> Result<ExtractedText> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("extract", %request_id, %backend);
        let _entered = span.enter();

        tracing::info!(
            "Extracting {} ({} bytes)",
            document.media_type().as_mime(),
            document.len()
        );

        let pages = self.pages(document)?;
        if pages.len() == 0 {
            tracing::info!("Document has no pages");
            return Ok(ExtractedText::new());
        }

        // Resolve once so a model load happens outside the page loop
        let recognizer = self.ocr.resolve(backend)?;
        let total = pages.len();

        let mut extracted = ExtractedText::new();
        for (index, page) in pages.enumerate() {
            let page = page?;
            let fragment = recognizer.recognize(&page)?;
            drop(page);

            tracing::debug!(
                "Page {}/{} recognized ({} chars)",
                index + 1,
                total,
                fragment.chars().count()
            );
            extracted.push(fragment);
        }

        tracing::info!("Extracted {} fragment(s)", extracted.fragment_count());
        Ok(extracted)
    }

    /// Normalise the document into an ordered raster sequence
    fn pages(&self, document: &Document) -> Result<PageStream> {
        if document.media_type().is_pdf() {
            return self.rasterizer.rasterize(document.bytes());
        }

        let image = decode_image(document.bytes(), document.media_type())?;
        Ok(Box::new(std::iter::once(Ok::<RasterImage, ExtractError>(
            image,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, RgbImage};

    use super::*;
    use crate::document::MediaType;
    use crate::ocr::testing::{MockEngine, MockRasterizer};
    use crate::ocr::{LazyEngine, OcrEngine};

    fn png_document(width: u32, height: u32) -> Document {
        let img = RgbImage::from_pixel(width, height, image::Rgb([0, 0, 0]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        Document::new(bytes, "image/png").unwrap()
    }

    fn pdf_document() -> Document {
        Document::with_media_type(b"%PDF-1.4 stub".to_vec(), MediaType::Pdf)
    }

    fn unloadable() -> LazyEngine {
        LazyEngine::new("ocrs", || {
            Err(ExtractError::EngineUnavailable("no models".into()))
        })
    }

    #[test]
    fn test_two_page_pdf_in_page_order() {
        let rasterizer = MockRasterizer::pages(2);
        let engine = MockEngine::pages(OcrBackend::Tesseract, &["Hello", "World"]);
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

        let text = extractor
            .extract(&pdf_document(), OcrBackend::Tesseract)
            .unwrap();
        assert_eq!(text.text(), "Hello\nWorld\n");
        assert_eq!(text.fragment_count(), 2);
        assert_eq!(engine.calls(), 2);
    }

    #[test]
    fn test_fragment_count_matches_page_count() {
        for pages in [1usize, 3, 7] {
            let rasterizer = MockRasterizer::pages(pages);
            let engine = MockEngine::echo(OcrBackend::Tesseract);
            let ocrs = unloadable();
            let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

            let text = extractor
                .extract(&pdf_document(), OcrBackend::Tesseract)
                .unwrap();
            assert_eq!(text.fragment_count(), pages);
            assert_eq!(text.text().matches('\n').count(), pages);
            // Page i is filled with byte i, so fragments prove ordering
            for (i, fragment) in text.fragments().iter().enumerate() {
                assert_eq!(fragment, &format!("2x2:{}", i));
            }
        }
    }

    #[test]
    fn test_zero_page_pdf_is_empty_and_loads_nothing() {
        let rasterizer = MockRasterizer::pages(0);
        let ocrs = LazyEngine::new("ocrs", || {
            Ok(Box::new(MockEngine::text(OcrBackend::Ocrs, "x")) as Box<dyn OcrEngine>)
        });
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(None, &ocrs));

        let text = extractor.extract(&pdf_document(), OcrBackend::Ocrs).unwrap();
        assert!(text.is_empty());
        assert_eq!(text.text(), "");
        assert!(!ocrs.is_loaded());
    }

    #[test]
    fn test_single_image_is_one_fragment() {
        let rasterizer = MockRasterizer::pages(5);
        let engine = MockEngine::text(OcrBackend::Tesseract, "just one");
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

        let text = extractor
            .extract(&png_document(6, 4), OcrBackend::Tesseract)
            .unwrap();
        assert_eq!(text.text(), "just one\n");
        assert_eq!(text.fragment_count(), 1);
        assert_eq!(rasterizer.calls(), 0);
        assert_eq!(engine.seen(), vec![(6, 4)]);
    }

    #[test]
    fn test_malformed_pdf_fails_before_recognition() {
        let rasterizer = MockRasterizer::malformed("bad xref");
        let engine = MockEngine::text(OcrBackend::Tesseract, "never");
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

        let err = extractor
            .extract(&pdf_document(), OcrBackend::Tesseract)
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument(_)));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_empty_pdf_buffer_is_malformed_not_recognition_failed() {
        let rasterizer = crate::raster::PdfRasterizer::new();
        let engine = MockEngine::text(OcrBackend::Tesseract, "never");
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

        let document = Document::new(Vec::new(), "application/pdf").unwrap();
        let err = extractor
            .extract(&document, OcrBackend::Tesseract)
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument(_)));
    }

    #[test]
    fn test_page_failure_aborts_without_partial_result() {
        let rasterizer = MockRasterizer::pages(3);
        let engine = MockEngine::failing_after(OcrBackend::Tesseract, 1, "engine crashed");
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

        let err = extractor
            .extract(&pdf_document(), OcrBackend::Tesseract)
            .unwrap_err();
        assert!(matches!(err, ExtractError::RecognitionFailed(_)));
        // Third page never reached
        assert_eq!(engine.calls(), 2);
    }

    #[test]
    fn test_model_loaded_once_across_pages_and_documents() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let ocrs = LazyEngine::new("ocrs", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockEngine::echo(OcrBackend::Ocrs)) as Box<dyn OcrEngine>)
        });
        let rasterizer = MockRasterizer::pages(4);
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(None, &ocrs));

        for _ in 0..2 {
            let text = extractor.extract(&pdf_document(), OcrBackend::Ocrs).unwrap();
            assert_eq!(text.fragment_count(), 4);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_engine_surfaces_error() {
        let rasterizer = MockRasterizer::pages(1);
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(None, &ocrs));

        let err = extractor
            .extract(&pdf_document(), OcrBackend::Ocrs)
            .unwrap_err();
        assert!(matches!(err, ExtractError::EngineUnavailable(_)));
    }

    #[test]
    fn test_undecodable_image_is_malformed() {
        let rasterizer = MockRasterizer::pages(0);
        let engine = MockEngine::text(OcrBackend::Tesseract, "never");
        let ocrs = unloadable();
        let extractor = Extractor::new(&rasterizer, OcrAdapter::new(Some(&engine), &ocrs));

        let document = Document::new(b"\xFF\xD8\xFF garbage".to_vec(), "image/jpeg").unwrap();
        let err = extractor
            .extract(&document, OcrBackend::Tesseract)
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument(_)));
        assert_eq!(engine.calls(), 0);
    }
}

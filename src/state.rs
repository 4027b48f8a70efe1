//! Application state management

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::document::Document;
use crate::error::Result;
use crate::extract::{ExtractedText, Extractor};
use crate::ocr::{LazyEngine, OcrAdapter, OcrBackend, OcrEngine, OcrsEngine, TesseractEngine};
use crate::raster::{PdfRasterizer, Rasterizer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    rasterizer: Arc<dyn Rasterizer>,
    tesseract: Option<Box<dyn OcrEngine>>,
    ocrs: LazyEngine,
    /// Held for the whole of one extraction
    extraction: Mutex<()>,
}

impl AppState {
    /// Create the application state from configuration
    ///
    /// Tesseract is set up eagerly since it is cheap. The ocrs models are
    /// only read on the first request that selects them.
    pub fn new(config: Config) -> Self {
        let tesseract = match TesseractEngine::new(
            &config.ocr.tesseract_language,
            config.ocr.tessdata_dir.clone(),
        ) {
            Ok(engine) => {
                tracing::info!(
                    "Tesseract engine ready (language: {})",
                    engine.language()
                );
                Some(Box::new(engine) as Box<dyn OcrEngine>)
            }
            Err(e) => {
                tracing::warn!("Tesseract engine disabled: {}", e);
                None
            }
        };

        let models = config.ocr.ocrs_models();
        let ocrs = LazyEngine::new("ocrs", move || {
            Ok(Box::new(OcrsEngine::load(&models)?) as Box<dyn OcrEngine>)
        });

        Self::with_engines(config, Arc::new(PdfRasterizer::new()), tesseract, ocrs)
    }

    /// Create the state around explicit engines
    pub fn with_engines(
        config: Config,
        rasterizer: Arc<dyn Rasterizer>,
        tesseract: Option<Box<dyn OcrEngine>>,
        ocrs: LazyEngine,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                rasterizer,
                tesseract,
                ocrs,
                extraction: Mutex::new(()),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn rasterizer(&self) -> &dyn Rasterizer {
        self.inner.rasterizer.as_ref()
    }

    /// Adapter borrowing this state's engines
    pub fn adapter(&self) -> OcrAdapter<'_> {
        OcrAdapter::new(self.inner.tesseract.as_deref(), &self.inner.ocrs)
    }

    /// Whether a backend can serve requests right now without loading
    pub fn is_ready(&self, backend: OcrBackend) -> bool {
        self.adapter().is_ready(backend)
    }

    /// Run one extraction to completion
    ///
    /// Blocking. Callers on the async runtime must go through
    /// `spawn_blocking`. Extractions never overlap.
    pub fn run_extraction(&self, document: &Document, backend: OcrBackend) -> Result<ExtractedText> {
        let _guard = self.inner.extraction.lock();
        Extractor::new(self.rasterizer(), self.adapter()).extract(document, backend)
    }
}

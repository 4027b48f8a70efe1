//! OCR Engines
//!
//! Defines the engine trait and the two concrete backends. Each backend is
//! behind a cargo feature; with the feature off, the constructor reports
//! `EngineUnavailable` instead.

use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};
use crate::raster::RasterImage;

use super::types::{OcrBackend, OcrOutput};

/// OCR engine trait
pub trait OcrEngine: Send + Sync {
    /// Backend this engine implements
    fn backend(&self) -> OcrBackend;

    /// Recognize text in a single raster
    ///
    /// Any engine failure is reported as `RecognitionFailed`; no partial
    /// output is returned.
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput>;
}

/// Tesseract engine
///
/// Stateless: a fresh Tesseract handle is created for every image and fed
/// the raw RGB frame.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    language: String,
    datapath: Option<PathBuf>,
}

impl TesseractEngine {
    pub fn new(language: &str, datapath: Option<PathBuf>) -> Result<Self> {
        if !OcrBackend::Tesseract.is_compiled() {
            return Err(ExtractError::EngineUnavailable(
                "tesseract backend not available (feature engine-tesseract disabled)".to_string(),
            ));
        }
        Ok(Self {
            language: language.to_string(),
            datapath,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl OcrEngine for TesseractEngine {
    fn backend(&self) -> OcrBackend {
        OcrBackend::Tesseract
    }

    #[cfg(feature = "engine-tesseract")]
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        let failed = |stage: &str, e: String| {
            ExtractError::RecognitionFailed(format!("tesseract {}: {}", stage, e))
        };

        let width = i32::try_from(image.width())
            .map_err(|e| failed("frame", e.to_string()))?;
        let height = i32::try_from(image.height())
            .map_err(|e| failed("frame", e.to_string()))?;
        let datapath = self
            .datapath
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned());

        let mut tess = tesseract::Tesseract::new(datapath.as_deref(), Some(&self.language))
            .map_err(|e| failed("init", e.to_string()))?
            .set_frame(image.pixels(), width, height, 3, width * 3)
            .map_err(|e| failed("frame", e.to_string()))?;
        let text = tess.get_text().map_err(|e| failed("recognition", e.to_string()))?;

        Ok(OcrOutput::Text(text))
    }

    #[cfg(not(feature = "engine-tesseract"))]
    fn recognize(&self, _image: &RasterImage) -> Result<OcrOutput> {
        Err(ExtractError::EngineUnavailable(
            "tesseract backend not available (feature engine-tesseract disabled)".to_string(),
        ))
    }
}

/// Model files for the ocrs engine
#[derive(Debug, Clone)]
pub struct OcrsModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

/// ocrs engine
///
/// Holds the loaded detection and recognition models. Construction is the
/// expensive part; recognition reuses the loaded models.
pub struct OcrsEngine {
    #[cfg(feature = "engine-ocrs")]
    engine: ocrs::OcrEngine,
}

impl OcrsEngine {
    /// Load both models from disk
    #[cfg(feature = "engine-ocrs")]
    pub fn load(paths: &OcrsModelPaths) -> Result<Self> {
        let detection_model = load_model(&paths.detection)?;
        let recognition_model = load_model(&paths.recognition)?;

        let engine = ocrs::OcrEngine::new(ocrs::OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| ExtractError::EngineUnavailable(format!("failed to build ocrs engine: {}", e)))?;

        Ok(Self { engine })
    }

    #[cfg(not(feature = "engine-ocrs"))]
    pub fn load(_paths: &OcrsModelPaths) -> Result<Self> {
        Err(ExtractError::EngineUnavailable(
            "ocrs backend not available (feature engine-ocrs disabled)".to_string(),
        ))
    }
}

#[cfg(feature = "engine-ocrs")]
fn load_model(path: &Path) -> Result<rten::Model> {
    rten::Model::load_file(path).map_err(|e| {
        ExtractError::EngineUnavailable(format!(
            "failed to load ocrs model at {}: {}",
            path.display(),
            e
        ))
    })
}

impl OcrEngine for OcrsEngine {
    fn backend(&self) -> OcrBackend {
        OcrBackend::Ocrs
    }

    #[cfg(feature = "engine-ocrs")]
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        use ocrs::TextItem;

        use super::types::{BoundingBox, TextDetection};

        let failed = |e: String| ExtractError::RecognitionFailed(format!("ocrs: {}", e));

        let source = ocrs::ImageSource::from_bytes(image.pixels(), image.dimensions())
            .map_err(|e| failed(e.to_string()))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| failed(e.to_string()))?;
        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|e| failed(e.to_string()))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| failed(e.to_string()))?;

        let detections = lines
            .into_iter()
            .flatten()
            .map(|line| {
                let rect = line.bounding_rect();
                let region = BoundingBox::new(
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.right() as f32,
                    rect.bottom() as f32,
                );
                TextDetection::new(region, line.to_string())
            })
            .collect();

        Ok(OcrOutput::Detections(detections))
    }

    #[cfg(not(feature = "engine-ocrs"))]
    fn recognize(&self, _image: &RasterImage) -> Result<OcrOutput> {
        Err(ExtractError::EngineUnavailable(
            "ocrs backend not available (feature engine-ocrs disabled)".to_string(),
        ))
    }
}

impl OcrsModelPaths {
    pub fn new(detection: impl AsRef<Path>, recognition: impl AsRef<Path>) -> Self {
        Self {
            detection: detection.as_ref().to_path_buf(),
            recognition: recognition.as_ref().to_path_buf(),
        }
    }
}

//! Mock engine and rasterizer for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ExtractError, Result};
use crate::raster::{PageStream, RasterImage, Rasterizer};

use super::provider::OcrEngine;
use super::types::{OcrBackend, OcrOutput};

enum Script {
    /// Return these outputs in call order, repeating the last one
    Sequence(Vec<std::result::Result<OcrOutput, String>>),
    /// Describe the image: `"<w>x<h>:<first byte>"`
    Echo,
}

/// Mock OCR engine
pub struct MockEngine {
    backend: OcrBackend,
    script: Script,
    calls: AtomicUsize,
    seen: Mutex<Vec<(u32, u32)>>,
}

impl MockEngine {
    fn with_script(backend: OcrBackend, script: Script) -> Self {
        Self {
            backend,
            script,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always return the same text
    pub fn text(backend: OcrBackend, text: &str) -> Self {
        Self::pages(backend, &[text])
    }

    /// Return one text per call, in order
    pub fn pages(backend: OcrBackend, texts: &[&str]) -> Self {
        let outputs = texts
            .iter()
            .map(|t| Ok(OcrOutput::Text(t.to_string())))
            .collect();
        Self::with_script(backend, Script::Sequence(outputs))
    }

    /// Return one output per call, in order
    pub fn outputs(backend: OcrBackend, outputs: Vec<OcrOutput>) -> Self {
        Self::with_script(
            backend,
            Script::Sequence(outputs.into_iter().map(Ok).collect()),
        )
    }

    /// Succeed `ok_calls` times, then fail
    pub fn failing_after(backend: OcrBackend, ok_calls: usize, message: &str) -> Self {
        let mut outputs: Vec<std::result::Result<OcrOutput, String>> = (0..ok_calls)
            .map(|i| Ok(OcrOutput::Text(format!("page {}", i))))
            .collect();
        outputs.push(Err(message.to_string()));
        Self::with_script(backend, Script::Sequence(outputs))
    }

    pub fn echo(backend: OcrBackend) -> Self {
        Self::with_script(backend, Script::Echo)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Dimensions of every image recognized so far
    pub fn seen(&self) -> Vec<(u32, u32)> {
        self.seen.lock().clone()
    }
}

impl OcrEngine for MockEngine {
    fn backend(&self) -> OcrBackend {
        self.backend
    }

    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(image.dimensions());

        match &self.script {
            Script::Echo => Ok(OcrOutput::Text(format!(
                "{}x{}:{}",
                image.width(),
                image.height(),
                image.pixels().first().copied().unwrap_or_default()
            ))),
            Script::Sequence(outputs) => {
                let entry = outputs
                    .get(call)
                    .or_else(|| outputs.last())
                    .cloned()
                    .unwrap_or_else(|| Ok(OcrOutput::Text(String::new())));
                entry.map_err(ExtractError::RecognitionFailed)
            }
        }
    }
}

/// Lets a test keep a handle on an engine it has handed over
impl<T: OcrEngine + ?Sized> OcrEngine for Arc<T> {
    fn backend(&self) -> OcrBackend {
        (**self).backend()
    }

    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        (**self).recognize(image)
    }
}

/// Rasterizer returning canned pages
pub struct MockRasterizer {
    pages: std::result::Result<Vec<RasterImage>, String>,
    calls: AtomicUsize,
}

impl MockRasterizer {
    /// `count` pages; page `i` is a 2x2 raster filled with byte `i`
    pub fn pages(count: usize) -> Self {
        let pages = (0..count)
            .map(|i| solid_raster(2, 2, i as u8))
            .collect();
        Self {
            pages: Ok(pages),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail to open with `MalformedDocument`
    pub fn malformed(message: &str) -> Self {
        Self {
            pages: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for MockRasterizer {
    fn rasterize(&self, _pdf: &[u8]) -> Result<PageStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.pages {
            Ok(pages) => Ok(Box::new(
                pages.clone().into_iter().map(Ok::<RasterImage, ExtractError>),
            )),
            Err(message) => Err(ExtractError::MalformedDocument(message.clone())),
        }
    }
}

pub fn solid_raster(width: u32, height: u32, value: u8) -> RasterImage {
    RasterImage::from_rgb(width, height, vec![value; (width * height * 3) as usize])
        .expect("buffer sized for dimensions")
}

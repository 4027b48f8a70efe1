//! PDF rasterization via MuPDF
//!
//! Pages are rendered lazily, one at a time, with the document's default
//! transform (no extra scaling) into device RGB without alpha. Each page
//! buffer is handed to the caller and dropped once its text is extracted.

use mupdf::{Colorspace, Document, Matrix};

use crate::error::{ExtractError, Result};

use super::{PageStream, RasterImage, Rasterizer};

const PDF_MIME: &str = "application/pdf";

/// The header may sit anywhere in the first KiB of the file
const HEADER_SEARCH_WINDOW: usize = 1024;

/// MuPDF-backed rasterizer
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRasterizer;

impl PdfRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Open a PDF and return its lazily rendered pages
    pub fn open(&self, pdf: &[u8]) -> Result<PdfPages> {
        if pdf.is_empty() {
            return Err(ExtractError::MalformedDocument(
                "empty PDF buffer".to_string(),
            ));
        }
        if !has_pdf_header(pdf) {
            return Err(ExtractError::MalformedDocument(
                "missing %PDF header".to_string(),
            ));
        }

        let doc = Document::from_bytes(pdf, PDF_MIME)
            .map_err(|e| ExtractError::MalformedDocument(format!("failed to open PDF: {}", e)))?;
        let count = doc
            .page_count()
            .map_err(|e| ExtractError::MalformedDocument(format!("failed to count pages: {}", e)))?;

        tracing::debug!("Opened PDF with {} page(s)", count);

        Ok(PdfPages {
            doc,
            next: 0,
            count: count.max(0),
        })
    }
}

impl Rasterizer for PdfRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<PageStream> {
        Ok(Box::new(self.open(pdf)?))
    }
}

/// Single-pass iterator over rendered PDF pages
///
/// Yields pages in ascending index order. After the first error the
/// iterator is exhausted.
pub struct PdfPages {
    doc: Document,
    next: i32,
    count: i32,
}

impl Iterator for PdfPages {
    type Item = Result<RasterImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }

        let index = self.next;
        self.next += 1;

        let page = render_page(&self.doc, index);
        if page.is_err() {
            self.next = self.count;
        }
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PdfPages {}

fn render_page(doc: &Document, index: i32) -> Result<RasterImage> {
    let malformed =
        |e: mupdf::Error| ExtractError::MalformedDocument(format!("page {}: {}", index, e));

    let page = doc.load_page(index).map_err(malformed)?;
    let matrix = Matrix::new_scale(1.0, 1.0);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page
        .to_pixmap(&matrix, &colorspace, false, true)
        .map_err(malformed)?;

    let raster = pixmap_to_raster(
        pixmap.samples(),
        pixmap.width() as u32,
        pixmap.height() as u32,
        pixmap.n() as usize,
    )
    .ok_or_else(|| {
        ExtractError::MalformedDocument(format!("page {}: unexpected pixmap layout", index))
    })?;

    tracing::debug!(
        "Rendered page {} to {}x{} raster",
        index,
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

/// Repack pixmap samples (any row padding, `n` components) into RGB
fn pixmap_to_raster(samples: &[u8], width: u32, height: u32, n: usize) -> Option<RasterImage> {
    if n < 3 {
        return None;
    }
    if width == 0 || height == 0 {
        return RasterImage::from_rgb(width, height, Vec::new());
    }

    let stride = samples.len() / height as usize;
    if stride < width as usize * n {
        return None;
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for row in samples.chunks(stride).take(height as usize) {
        for pixel in row[..width as usize * n].chunks_exact(n) {
            rgb.extend_from_slice(&pixel[..3]);
        }
    }

    RasterImage::from_rgb(width, height, rgb)
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

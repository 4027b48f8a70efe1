//! Raster images
//!
//! Everything the OCR engines see is a [`RasterImage`]: an owned 8-bit RGB
//! bitmap. Uploaded images are decoded directly; PDFs go through a
//! [`Rasterizer`] that yields one image per page.

mod pdf;

use std::io::Cursor;

use image::{DynamicImage, RgbImage};

use crate::document::MediaType;
use crate::error::{ExtractError, Result};

pub use pdf::{PdfPages, PdfRasterizer};

/// Ordered, single-pass sequence of rendered pages
pub type PageStream = Box<dyn ExactSizeIterator<Item = Result<RasterImage>>>;

/// Converts a PDF byte stream into page images
pub trait Rasterizer: Send + Sync {
    /// Open the document and return its pages in ascending index order
    ///
    /// Fails with `MalformedDocument` if the bytes are not a PDF.
    fn rasterize(&self, pdf: &[u8]) -> Result<PageStream>;
}

/// In-memory RGB bitmap for one page or one standalone image
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    buffer: RgbImage,
}

impl RasterImage {
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Build from a packed RGB buffer (`width * height * 3` bytes)
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, pixels).map(Self::new)
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Packed RGB samples, row-major, no padding
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// True when the bitmap has zero area
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.buffer
    }
}

/// Decode an uploaded JPEG or PNG into a raster
pub fn decode_image(bytes: &[u8], media_type: MediaType) -> Result<RasterImage> {
    let format = match media_type {
        MediaType::Jpeg => image::ImageFormat::Jpeg,
        MediaType::Png => image::ImageFormat::Png,
        MediaType::Pdf => {
            return Err(ExtractError::UnsupportedMediaType(
                "application/pdf is not a raster image".to_string(),
            ))
        }
    };

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        ExtractError::MalformedDocument(format!("{} could not be decoded: {}", media_type.as_mime(), e))
    })?;

    let raster = RasterImage::new(decoded.to_rgb8());
    if raster.is_empty() {
        return Err(ExtractError::MalformedDocument(
            "image has zero area".to_string(),
        ));
    }

    tracing::debug!(
        "Decoded {} upload to {}x{} raster",
        media_type.as_mime(),
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

/// Encode a raster as PNG (used for previews)
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(raster.as_rgb().clone())
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| ExtractError::MalformedDocument(format!("failed to encode preview: {}", e)))?;
    Ok(output)
}

//! Extraction API endpoints
//!
//! Multipart uploads in, text or a packaged download out:
//! - List OCR backends and whether they are ready
//! - Extract text from an image or PDF
//! - Download the extracted text as plain text or a JSON envelope
//! - Preview the upload (the image itself, or the first PDF page) as PNG
//!
//! Every upload form uses the field names `file`, `backend` and `format`.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::document::{Document, MediaType};
use crate::error::{AppError, ExtractError};
use crate::export::{self, ExportFormat};
use crate::extract::ExtractedText;
use crate::ocr::OcrBackend;
use crate::raster::{decode_image, encode_png};
use crate::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

/// Create the extraction router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/backends", get(list_backends))
        .route("/extract", post(extract_text))
        .route("/extract/download", post(download_text))
        .route("/preview", post(preview_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Backend availability
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfo {
    pub id: &'static str,
    pub label: &'static str,
    /// Built with the engine's cargo feature
    pub compiled: bool,
    /// Engine ready without a model load
    pub loaded: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendListResponse {
    pub backends: Vec<BackendInfo>,
}

/// Extraction response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub text: String,
    pub fragments: Vec<String>,
    pub backend: &'static str,
    pub download: DownloadInfo,
}

/// How the text would be packaged for download
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadInfo {
    pub filename: &'static str,
    pub mime_type: &'static str,
}

/// The file part of an upload
struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Fields collected from a multipart form
#[derive(Default)]
struct UploadForm {
    file: Option<Upload>,
    backend: Option<String>,
    format: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "file" | "document" => {
                    let filename = field.file_name().map(|s| s.to_string());
                    let content_type = field.content_type().map(|s| s.to_string());
                    let bytes = field.bytes().await?;

                    tracing::debug!(
                        "Received file: filename={:?}, content_type={:?}, {} bytes",
                        filename,
                        content_type,
                        bytes.len()
                    );

                    form.file = Some(Upload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                "backend" => form.backend = Some(field.text().await?),
                "format" => form.format = Some(field.text().await?),
                other => tracing::debug!("Ignoring form field '{}'", other),
            }
        }

        Ok(form)
    }

    /// Take the uploaded file as a validated document
    fn take_document(&mut self) -> Result<Document, AppError> {
        let upload = self.file.take().ok_or_else(|| {
            AppError::BadRequest("No file provided. Use field name 'file'".to_string())
        })?;

        let mime = upload_media_type(
            upload.content_type.as_deref(),
            upload.filename.as_deref(),
            &upload.bytes,
        );
        Ok(Document::new(upload.bytes, &mime)?)
    }

    fn backend(&self) -> Result<OcrBackend, AppError> {
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("No OCR backend selected".to_string()))?;
        Ok(backend.parse::<OcrBackend>()?)
    }

    /// Selected export format, `None` when the field is absent or blank
    fn format(&self) -> Result<Option<ExportFormat>, AppError> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(format) => Ok(Some(format.parse::<ExportFormat>()?)),
        }
    }
}

/// Declared content type, or a guess when the client sent none or a
/// generic one: first from the file name, then from the leading bytes
fn upload_media_type(declared: Option<&str>, filename: Option<&str>, bytes: &[u8]) -> String {
    match declared.map(str::trim) {
        Some(mime) if !mime.is_empty() && !mime.eq_ignore_ascii_case(OCTET_STREAM) => {
            mime.to_string()
        }
        _ => filename
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .or_else(|| MediaType::from_magic_bytes(bytes).map(MediaType::as_mime))
            .unwrap_or(OCTET_STREAM)
            .to_string(),
    }
}

/// Run the blocking pipeline off the async runtime
async fn run_extraction(
    state: AppState,
    document: Document,
    backend: OcrBackend,
) -> Result<ExtractedText, AppError> {
    let extracted = tokio::task::spawn_blocking(move || state.run_extraction(&document, backend))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;
    Ok(extracted)
}

/// List the OCR backends
async fn list_backends(State(state): State<AppState>) -> Json<BackendListResponse> {
    let backends = OcrBackend::ALL
        .into_iter()
        .map(|backend| BackendInfo {
            id: backend.as_str(),
            label: backend.label(),
            compiled: backend.is_compiled(),
            loaded: state.is_ready(backend),
        })
        .collect();

    Json(BackendListResponse { backends })
}

/// Extract text from an uploaded image or PDF
///
/// `format` only picks the advertised download and defaults to plain text,
/// matching the preselected "Text File" choice of the upload form.
async fn extract_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let document = form.take_document()?;
    let backend = form.backend()?;
    let format = form.format()?.unwrap_or(ExportFormat::PlainText);

    let extracted = run_extraction(state, document, backend).await?;

    Ok(Json(ExtractResponse {
        text: extracted.text(),
        fragments: extracted.fragments().to_vec(),
        backend: backend.as_str(),
        download: DownloadInfo {
            filename: format.filename(),
            mime_type: format.mime_type(),
        },
    }))
}

/// Extract text and return it as a downloadable file
async fn download_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let document = form.take_document()?;
    let backend = form.backend()?;
    let format = form
        .format()?
        .ok_or_else(|| AppError::BadRequest("No export format selected".to_string()))?;

    let extracted = run_extraction(state, document, backend).await?;
    let package = export::package(&extracted.text(), format);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, package.mime_type)
        .header(header::CONTENT_LENGTH, package.payload.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", package.filename),
        )
        .body(Body::from(package.payload))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Render the upload, or its first page, as PNG
async fn preview_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let document = form.take_document()?;

    let png = tokio::task::spawn_blocking(move || render_preview(&state, &document))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CONTENT_LENGTH, png.len())
        .body(Body::from(png))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn render_preview(state: &AppState, document: &Document) -> crate::error::Result<Vec<u8>> {
    let image = if document.media_type().is_pdf() {
        let mut pages = state.rasterizer().rasterize(document.bytes())?;
        pages
            .next()
            .ok_or_else(|| ExtractError::MalformedDocument("PDF has no pages".to_string()))??
    } else {
        decode_image(document.bytes(), document.media_type())?
    };

    encode_png(&image)
}

//! Error types for OCR Master
//!
//! `ExtractError` is the pipeline taxonomy. `AppError` wraps it for the
//! HTTP shell and owns the mapping to status codes.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors raised by the extraction pipeline
///
/// Every variant propagates unmodified to the caller. None of them is ever
/// turned into text output.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// PDF could not be parsed or rendered, or an image could not be decoded
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Declared media type is outside the accepted set
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Backend selection is not one of the known engines
    #[error("Unsupported OCR backend: {0}")]
    UnsupportedBackend(String),

    /// The OCR engine failed on an image
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    /// Engine compiled out, or its model could not be loaded
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Export selection is not one of the known formats
    #[error("Unsupported export format: {0}")]
    UnsupportedExportFormat(String),
}

impl ExtractError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnsupportedBackend(_) | Self::UnsupportedExportFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RecognitionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind used in error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedDocument(_) => "malformed_document",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::UnsupportedBackend(_) => "unsupported_backend",
            Self::RecognitionFailed(_) => "recognition_failed",
            Self::EngineUnavailable(_) => "engine_unavailable",
            Self::UnsupportedExportFormat(_) => "unsupported_export_format",
        }
    }
}

/// Application error type for HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Multipart(e) => {
                tracing::warn!("Rejected upload: {}", e);
                (e.status(), "invalid_upload", e.body_text())
            }
            AppError::Extract(e) => {
                let status = e.status_code();
                if status.is_server_error() {
                    tracing::error!("Extraction failed: {}", e);
                } else {
                    tracing::warn!("Extraction rejected: {}", e);
                }
                (status, e.kind(), e.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(format!("{:?}", self))
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

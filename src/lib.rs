//! OCR Master Library
//!
//! Extracts text from uploaded images and PDFs with a selectable OCR engine.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `document`: Uploaded bytes plus their accepted media type
//! - `raster`: Image decoding and PDF page rendering via MuPDF
//! - `ocr`: Engine trait, Tesseract and ocrs engines, backend dispatch
//! - `extract`: Page-ordered extraction over a whole document
//! - `export`: Plain text and JSON download packaging
//! - `routes`: HTTP endpoints

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod extract;
pub mod ocr;
pub mod raster;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/health", get(routes::health::health_check))
        .nest("/api/v1", routes::extract::router(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

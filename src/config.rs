//! Configuration management for OCR Master

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::ocr::OcrsModelPaths;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code, e.g. `eng` or `eng+deu`
    pub tesseract_language: String,
    /// Directory holding `tessdata`; tesseract's own default when unset
    pub tessdata_dir: Option<PathBuf>,
    pub ocrs_detection_model: PathBuf,
    pub ocrs_recognition_model: PathBuf,
}

impl OcrConfig {
    pub fn ocrs_models(&self) -> OcrsModelPaths {
        OcrsModelPaths::new(&self.ocrs_detection_model, &self.ocrs_recognition_model)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8501,
                max_upload_bytes: 50 * 1024 * 1024,
            },
            ocr: OcrConfig {
                tesseract_language: "eng".to_string(),
                tessdata_dir: None,
                ocrs_detection_model: PathBuf::from("models/text-detection.rten"),
                ocrs_recognition_model: PathBuf::from("models/text-recognition.rten"),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: parse_or(
                    &lookup,
                    "MAX_UPLOAD_BYTES",
                    defaults.server.max_upload_bytes,
                )?,
            },
            ocr: OcrConfig {
                tesseract_language: lookup("TESSERACT_LANGUAGE")
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(defaults.ocr.tesseract_language),
                tessdata_dir: lookup("TESSDATA_PREFIX_DIR")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
                ocrs_detection_model: lookup("OCRS_DETECTION_MODEL")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.ocrs_detection_model),
                ocrs_recognition_model: lookup("OCRS_RECOGNITION_MODEL")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.ocrs_recognition_model),
            },
        })
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

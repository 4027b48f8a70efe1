//! Lazily loaded OCR engine
//!
//! Engines with an expensive setup (model loading) live in a [`LazyEngine`].
//! The slot is owned by whoever owns the process state and is passed by
//! reference to the adapter. The engine is built on first use, kept for the
//! rest of the process and never torn down.

use std::fmt;
use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::error::Result;

use super::provider::OcrEngine;

type Loader = Box<dyn Fn() -> Result<Box<dyn OcrEngine>> + Send + Sync>;

/// Construct-on-first-use engine slot
pub struct LazyEngine {
    name: &'static str,
    cell: OnceCell<Box<dyn OcrEngine>>,
    loader: Loader,
}

impl LazyEngine {
    /// Create an empty slot with the loader that will fill it
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn OcrEngine>> + Send + Sync + 'static,
    {
        Self {
            name,
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Get the engine, loading it on first use
    ///
    /// Concurrent callers block until the single load finishes. A failed
    /// load leaves the slot empty so a later call may try again.
    pub fn get(&self) -> Result<&dyn OcrEngine> {
        let engine = self.cell.get_or_try_init(|| {
            tracing::info!("Loading {} OCR model...", self.name);
            let started = Instant::now();
            let engine = (self.loader)();
            match &engine {
                Ok(_) => tracing::info!(
                    "{} OCR model loaded in {:.2?}",
                    self.name,
                    started.elapsed()
                ),
                Err(e) => tracing::warn!("{} OCR model failed to load: {}", self.name, e),
            }
            engine
        })?;
        Ok(engine.as_ref())
    }

    /// Whether the engine has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for LazyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEngine")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

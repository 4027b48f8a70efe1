//! Uploaded documents
//!
//! A [`Document`] is the only input the extraction pipeline accepts. Its
//! media type is validated on construction, so anything outside the
//! accepted set never reaches the orchestrator.

mod types;

pub use types::{Document, MediaType};

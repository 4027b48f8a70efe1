//! Route modules for OCR Master

pub mod extract;
pub mod health;

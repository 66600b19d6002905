//! Google Gemini provider.

mod client;
pub mod config;
pub mod convert;

pub use client::GeminiModel;
pub use config::{DEFAULT_MODEL, GEMINI_API_BASE, GeminiConfig};

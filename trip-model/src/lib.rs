//! # trip-model
//!
//! Language model backends for the travel-booking agents.
//!
//! - [`GeminiModel`] - Google Gemini over the `generateContent` REST API
//! - [`MockLlm`] - Scripted or closure-backed model for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trip_model::GeminiModel;
//!
//! let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();
//! let model = GeminiModel::new(&api_key, "gemini-2.5-flash-lite")
//!     .map(|m| m.with_max_output_tokens(1000));
//! ```

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiConfig, GeminiModel};
pub use mock::MockLlm;

//! # trip-tool
//!
//! Tools the booking agents can call.
//!
//! - [`FunctionTool`] - Wrap an async Rust function as a tool
//! - [`MockTool`] - Canned, templated stand-in used by evaluation runs
//!
//! ```rust,no_run
//! use trip_tool::FunctionTool;
//! use serde_json::json;
//!
//! let tool = FunctionTool::new("book_flight", "Books a flight", |_ctx, args| async move {
//!     Ok(json!(format!("Flight booked to {}.", args["to_airport"].as_str().unwrap_or("?"))))
//! });
//! ```

mod function_tool;
mod mock_tool;

pub use function_tool::FunctionTool;
pub use mock_tool::{MockTool, render_template};

//! # trip-agent
//!
//! Agent implementations for the travel-booking pipeline.
//!
//! - [`LlmAgent`] - A model-backed agent with tools, input slots and an output key
//! - [`SequentialAgent`] - Runs sub-agents one after another
//!
//! ## Example
//!
//! ```rust,ignore
//! use trip_agent::{LlmAgentBuilder, SequentialAgent};
//!
//! let flight = LlmAgentBuilder::new("flight_booking_agent")
//!     .model(model.clone())
//!     .instruction("You only handle flight booking.")
//!     .tool(book_flight)
//!     .output_key("flight_booking")
//!     .build()?;
//!
//! let supervisor = SequentialAgent::new("supervisor_agent", vec![Arc::new(flight)]);
//! ```

mod llm_agent;
pub mod workflow;

pub use llm_agent::{EMPTY_SLOT, LlmAgent, LlmAgentBuilder};
pub use workflow::SequentialAgent;

//! # trip-core
//!
//! Core traits and types for the travel-booking agent pipeline.
//!
//! ## Overview
//!
//! - [`Agent`] - The interface every pipeline stage implements
//! - [`Llm`] - The hosted language model seam
//! - [`Tool`] - Callable functions an agent may invoke during its turn
//! - [`Event`] - Streamed agent output, including output-slot writes
//! - [`AgentOutcome`] - Acted / abstained / errored result of one turn
//! - [`TripError`] / [`Result`] - Unified error handling
//!
//! ## Core Traits
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Agent: Send + Sync {
//!     fn name(&self) -> &str;
//!     fn description(&self) -> &str;
//!     fn sub_agents(&self) -> &[Arc<dyn Agent>];
//!     async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream>;
//! }
//! ```

pub mod agent;
pub mod context;
pub mod error;
pub mod event;
pub mod model;
pub mod tool;
pub mod types;

pub use agent::{Agent, AgentOutcome, EventStream, ToolCallRecord};
pub use context::{InvocationContext, ReadonlyContext, ReadonlyState, Session};
pub use error::{Result, TripError};
pub use event::{Event, EventActions};
pub use model::{
    FinishReason, GenerateContentConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream,
    UsageMetadata,
};
pub use tool::{Tool, ToolContext};
pub use types::{Content, FunctionResponseData, Part};

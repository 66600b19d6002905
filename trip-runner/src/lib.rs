//! # trip-runner
//!
//! Drives a root agent for one user turn: loads the session, builds the
//! invocation context, streams events back and persists them.

mod context;
mod runner;

pub use context::{InvocationContext, MutableSession};
pub use runner::{Runner, RunnerConfig};

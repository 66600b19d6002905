//! # trip-cli
//!
//! Command-line front end for the travel booking pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # One request
//! trip Book a flight from San Francisco to Mumbai for 26th March 2026.
//!
//! # Interactive prompt
//! trip --profile clarifying
//!
//! # Keep the agent and tool spans
//! trip --trace-json trace.json Book a room at Marriot Juhu for 2 nights.
//! ```
//!
//! Configuration comes from the environment (and a `.env` file), see
//! [`PipelineConfig::from_env`](trip_booking::PipelineConfig::from_env).
//! Flags override it.

pub mod cli;
pub mod console;

pub use cli::Cli;
pub use console::{GREETING, ask, run_console, write_trace};

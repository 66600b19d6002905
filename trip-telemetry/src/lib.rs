//! # trip-telemetry
//!
//! Observability for the travel-booking pipeline.
//!
//! ## Features
//! - Structured logging with `tracing`
//! - OpenTelemetry OTLP export
//! - In-process capture of the agentic span tree for evaluation
//!
//! ## Usage
//!
//! ```rust
//! use trip_telemetry::{TraceCollector, TraceLayer, turn_span};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let collector = TraceCollector::new();
//! let subscriber = tracing_subscriber::registry().with(TraceLayer::new(collector.clone()));
//! tracing::subscriber::with_default(subscriber, || {
//!     let _turn = turn_span("supervisor_agent", "session-1", "Book a flight").entered();
//! });
//! assert_eq!(collector.spans().len(), 1);
//! ```

pub mod init;
pub mod span_exporter;
pub mod spans;

pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use init::{init_telemetry, init_with_collector, init_with_otlp, shutdown_telemetry};
pub use span_exporter::{Entity, EntityType, SpanKind, SpanRecord, TraceCollector, TraceLayer};
pub use spans::*;

//! # trip-eval
//!
//! Trace-level testing for the travel-booking pipeline.
//!
//! - [`TraceAsserter`] - fluent assertions over captured agentic spans
//! - [`ResponseScorer`] - text similarity (exact, contains, Jaccard, Levenshtein, ROUGE)
//! - [`EmbeddingScorer`] - token-embedding precision / recall / F1
//! - [`TestCase`] / [`TraceValidator`] - declarative JSON test cases
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trip_eval::{TestCase, TraceValidator};
//!
//! let cases = TestCase::load_all("tests/cases/flight_only.json")?;
//! let report = TraceValidator::new().run_all(&cases, &runner).await?;
//! assert!(report.all_passed(), "{}", report.format_summary());
//! ```

pub mod asserter;
pub mod criteria;
pub mod embedding;
pub mod error;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod validator;

pub use asserter::{SpanAssertion, TraceAsserter};
pub use criteria::{DEFAULT_SIMILARITY_THRESHOLD, ResponseMatchConfig, SimilarityAlgorithm};
pub use embedding::{Embedder, EmbeddingScore, EmbeddingScorer, HashingEmbedder};
pub use error::{EvalError, Result};
pub use report::{CaseResult, Failure, ValidationReport, ValidationSummary};
pub use schema::{Comparer, MockToolSpec, SpanEval, SpanExpectation, TestCase};
pub use scoring::ResponseScorer;
pub use validator::{CaseRun, CaseRunner, TraceValidator};

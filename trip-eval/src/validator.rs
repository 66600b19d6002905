//! Runs declarative test cases and checks the resulting trace

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use trip_telemetry::SpanRecord;

use crate::criteria::{DEFAULT_SIMILARITY_THRESHOLD, ResponseMatchConfig};
use crate::embedding::EmbeddingScorer;
use crate::error::{EvalError, Result};
use crate::report::{CaseResult, Failure, ValidationReport};
use crate::schema::{Comparer, SpanExpectation, SpanField, TestCase};
use crate::scoring::ResponseScorer;

/// What one test case produced
#[derive(Debug, Clone, Default)]
pub struct CaseRun {
    /// Final output of the last request
    pub output: String,
    /// Agentic spans captured while the case ran
    pub spans: Vec<SpanRecord>,
    /// Error message if a request failed
    pub error: Option<String>,
}

/// Executes a test case against the system under test
///
/// Implementations apply the case's `mock_tools`, send each request and
/// collect the spans. A pipeline failure belongs in [`CaseRun::error`];
/// `Err` is reserved for failing to set the run up.
#[async_trait]
pub trait CaseRunner: Send + Sync {
    async fn run_case(&self, case: &TestCase) -> Result<CaseRun>;
}

/// Checks test cases against captured traces
pub struct TraceValidator {
    scorer: ResponseScorer,
    similarity_threshold: f64,
    embedding: EmbeddingScorer,
}

impl TraceValidator {
    pub fn new() -> Self {
        Self {
            scorer: ResponseScorer::with_config(ResponseMatchConfig::similarity()),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            embedding: EmbeddingScorer::default(),
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_response_config(mut self, config: ResponseMatchConfig) -> Self {
        self.scorer = ResponseScorer::with_config(config);
        self
    }

    pub fn with_embedding_scorer(mut self, scorer: EmbeddingScorer) -> Self {
        self.embedding = scorer;
        self
    }

    /// Run every case and collect the results
    pub async fn run_all(
        &self,
        cases: &[TestCase],
        runner: &dyn CaseRunner,
    ) -> Result<ValidationReport> {
        let started_at = chrono::Utc::now();
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.run(case, runner).await?);
        }
        let report = ValidationReport::new(results, started_at);
        info!(
            total = report.summary.total,
            failed = report.summary.failed,
            "trace validation finished"
        );
        Ok(report)
    }

    pub async fn run(&self, case: &TestCase, runner: &dyn CaseRunner) -> Result<CaseResult> {
        case.check()?;
        let start = Instant::now();
        let run = runner.run_case(case).await?;
        let (scores, failures) = self.check(case, &run).await?;
        let case_id = case.test_input.first().map(String::as_str).unwrap_or_default();
        let result = CaseResult::new(case_id, scores, failures, start.elapsed());
        if !result.passed {
            warn!(case = case_id, failures = result.failures.len(), "test case failed");
        }
        Ok(result)
    }

    /// Check an already captured run against `case`
    pub async fn validate(&self, case: &TestCase, run: &CaseRun) -> Result<CaseResult> {
        case.check()?;
        let (scores, failures) = self.check(case, run).await?;
        let case_id = case.test_input.first().map(String::as_str).unwrap_or_default();
        Ok(CaseResult::new(case_id, scores, failures, std::time::Duration::ZERO))
    }

    async fn check(
        &self,
        case: &TestCase,
        run: &CaseRun,
    ) -> Result<(BTreeMap<String, f64>, Vec<Failure>)> {
        let mut scores = BTreeMap::new();
        let mut failures = Vec::new();

        let errors_expected = case.test_spans.iter().any(|s| s.expect_errors == Some(true));
        if let Some(error) = run.error.as_ref().filter(|_| !errors_expected) {
            failures.push(Failure::new("run", error.clone()));
        }

        if let Some(expected) = &case.test_output {
            let (ok, score) = self.compare(expected, &run.output, case.comparer);
            scores.insert("test_output".to_string(), score);
            if !ok {
                failures.push(Failure::new(
                    "test_output",
                    format!(
                        "{:?} does not match expected {:?} ({:.3})",
                        run.output, expected, score
                    ),
                ));
            }
        }

        for expectation in &case.test_spans {
            let label = expectation.label();
            match self.check_span(expectation, &run.spans).await? {
                SpanVerdict::Matched(span_scores) => {
                    for (name, score) in span_scores {
                        scores.insert(format!("{label}.{name}"), score);
                    }
                }
                SpanVerdict::Missing => {
                    failures.push(Failure::new(label, "no span of this type with these entities"));
                }
                SpanVerdict::Mismatched(reason) => failures.push(Failure::new(label, reason)),
            }
        }

        debug!(failures = failures.len(), "test case checked");
        Ok((scores, failures))
    }

    /// A candidate passes when every check on it holds; the best-scoring
    /// reason is reported when none does.
    async fn check_span(
        &self,
        expectation: &SpanExpectation,
        spans: &[SpanRecord],
    ) -> Result<SpanVerdict> {
        let candidates: Vec<&SpanRecord> =
            spans.iter().filter(|s| expectation.selects(s)).collect();
        if candidates.is_empty() {
            return Ok(SpanVerdict::Missing);
        }

        let mut reason = String::new();
        for span in candidates {
            match self.check_candidate(expectation, span).await? {
                Ok(scores) => return Ok(SpanVerdict::Matched(scores)),
                Err(why) => reason = why,
            }
        }
        Ok(SpanVerdict::Mismatched(reason))
    }

    async fn check_candidate(
        &self,
        expectation: &SpanExpectation,
        span: &SpanRecord,
    ) -> Result<std::result::Result<BTreeMap<String, f64>, String>> {
        let mut scores = BTreeMap::new();

        let fields = [
            ("input", &expectation.input, &span.input),
            ("output", &expectation.output, &span.output),
        ];
        for (field, expected, actual) in fields {
            let Some(expected) = expected else { continue };
            let (ok, score) = self.compare(expected, actual, expectation.comparer);
            scores.insert(field.to_string(), score);
            if !ok {
                return Ok(Err(format!(
                    "{field} {actual:?} does not match {expected:?} ({score:.3})"
                )));
            }
        }

        if let Some(expect_errors) = expectation.expect_errors.filter(|e| *e != span.error) {
            return Ok(Err(format!("error flag is {}, expected {}", span.error, expect_errors)));
        }

        if let Some(eval) = &expectation.eval {
            if eval.eval != "bert_score" {
                return Err(EvalError::InvalidCase(format!("unknown eval '{}'", eval.eval)));
            }
            let candidate = SpanField::parse(&eval.args[0])?.read(span);
            let reference = SpanField::parse(&eval.args[1])?.read(span);
            let score = self.embedding.score(candidate, reference).await?;
            scores.insert("bert_score.precision".to_string(), score.precision);
            scores.insert("bert_score.recall".to_string(), score.recall);
            scores.insert("bert_score.f1".to_string(), score.f1);
            if !score.meets(&eval.expected_result) {
                return Ok(Err(format!(
                    "bert_score ({}) P={:.3} R={:.3} F1={:.3} \
                     below minimum P={:.3} R={:.3} F1={:.3}",
                    self.embedding.embedder_name(),
                    score.precision,
                    score.recall,
                    score.f1,
                    eval.expected_result.precision,
                    eval.expected_result.recall,
                    eval.expected_result.f1
                )));
            }
        }

        Ok(Ok(scores))
    }

    fn compare(&self, expected: &str, actual: &str, comparer: Comparer) -> (bool, f64) {
        match comparer {
            Comparer::Exact => {
                let ok = expected.trim() == actual.trim();
                (ok, if ok { 1.0 } else { 0.0 })
            }
            Comparer::Contains => {
                let ok = actual.contains(expected);
                (ok, if ok { 1.0 } else { 0.0 })
            }
            Comparer::Similarity | Comparer::Metric => {
                let score = self.scorer.score(expected, actual);
                (score >= self.similarity_threshold, score)
            }
        }
    }
}

impl Default for TraceValidator {
    fn default() -> Self {
        Self::new()
    }
}

enum SpanVerdict {
    Matched(BTreeMap<String, f64>),
    Missing,
    Mismatched(String),
}

//! Declarative trace test cases
//!
//! A test case file holds a JSON array of cases:
//!
//! ```json
//! [{
//!   "test_input": ["Book a flight from San Francisco to Mumbai."],
//!   "mock_tools": [{"name": "book_flight",
//!                   "response": {"status": "success",
//!                                "message": "Flight booked from {{from_airport}} to {{to_airport}}."}}],
//!   "test_spans": [{"span_type": "agentic.tool.invocation",
//!                   "entities": [{"type": "tool", "name": "book_flight"}],
//!                   "output": "Flight booked from San Francisco to Mumbai.",
//!                   "comparer": "contains"}]
//! }]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use trip_telemetry::{Entity, SpanKind, SpanRecord};

use crate::embedding::EmbeddingScore;
use crate::error::{EvalError, Result};

/// How an expected text is compared with the actual one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparer {
    #[default]
    Similarity,
    Exact,
    /// The actual text contains the expected text
    Contains,
    /// Only meaningful on an `eval` block
    Metric,
}

/// One pipeline run plus the expectations on its result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCase {
    /// Requests sent to the pipeline, one run each
    pub test_input: Vec<String>,
    /// Expected final output of the last run
    #[serde(default)]
    pub test_output: Option<String>,
    #[serde(default)]
    pub comparer: Comparer,
    #[serde(default)]
    pub test_spans: Vec<SpanExpectation>,
    /// Tools replaced by canned responses for this case
    #[serde(default)]
    pub mock_tools: Vec<MockToolSpec>,
}

impl TestCase {
    pub fn new(input: impl Into<String>) -> Self {
        Self { test_input: vec![input.into()], ..Default::default() }
    }

    pub fn with_output(mut self, output: impl Into<String>, comparer: Comparer) -> Self {
        self.test_output = Some(output.into());
        self.comparer = comparer;
        self
    }

    pub fn with_span(mut self, span: SpanExpectation) -> Self {
        self.test_spans.push(span);
        self
    }

    pub fn with_mock_tool(mut self, name: impl Into<String>, response: Value) -> Self {
        self.mock_tools.push(MockToolSpec { name: name.into(), tool_type: None, response });
        self
    }

    /// Load every case in a JSON file holding one case or an array of them
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EvalError::LoadError(format!("{}: {}", path.display(), e)))?;
        let cases = match serde_json::from_str::<Value>(&content)? {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<Vec<TestCase>, _>>()?,
            single => vec![serde_json::from_value(single)?],
        };
        for case in &cases {
            case.check()?;
        }
        Ok(cases)
    }

    /// Reject cases that could never pass
    pub fn check(&self) -> Result<()> {
        if self.test_input.is_empty() || self.test_input.iter().any(|i| i.trim().is_empty()) {
            return Err(EvalError::InvalidCase("test_input must hold non-empty requests".into()));
        }
        if self.comparer == Comparer::Metric {
            return Err(EvalError::InvalidCase(
                "the metric comparer applies to span eval blocks only".into(),
            ));
        }
        for span in &self.test_spans {
            if let Some(eval) = &span.eval {
                if eval.args.len() != 2 {
                    return Err(EvalError::InvalidCase(format!(
                        "eval '{}' takes two span fields, got {}",
                        eval.eval,
                        eval.args.len()
                    )));
                }
                for arg in &eval.args {
                    SpanField::parse(arg)?;
                }
            }
        }
        Ok(())
    }
}

/// Expected properties of one span in the trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanExpectation {
    pub span_type: SpanKind,
    /// Entities the span must carry; extra entities on the span are fine
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub comparer: Comparer,
    /// `Some(false)` requires a clean span, `Some(true)` a failed one
    #[serde(default)]
    pub expect_errors: Option<bool>,
    #[serde(default)]
    pub eval: Option<SpanEval>,
}

impl SpanExpectation {
    pub fn new(span_type: SpanKind) -> Self {
        Self {
            span_type,
            entities: Vec::new(),
            input: None,
            output: None,
            comparer: Comparer::default(),
            expect_errors: None,
            eval: None,
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>, comparer: Comparer) -> Self {
        self.output = Some(output.into());
        self.comparer = comparer;
        self
    }

    pub fn without_errors(mut self) -> Self {
        self.expect_errors = Some(false);
        self
    }

    /// Whether `span` has this kind and carries every expected entity
    pub fn selects(&self, span: &SpanRecord) -> bool {
        span.kind == self.span_type && self.entities.iter().all(|e| span.entities.contains(e))
    }

    /// Human-readable label used in failure messages
    pub fn label(&self) -> String {
        let names: Vec<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();
        if names.is_empty() {
            self.span_type.as_str().to_string()
        } else {
            format!("{} [{}]", self.span_type.as_str(), names.join(", "))
        }
    }
}

/// Metric evaluation over two fields of a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEval {
    /// Metric name; only `bert_score` is known
    pub eval: String,
    /// Candidate field then reference field, each `input` or `output`
    pub args: Vec<String>,
    pub expected_result: EmbeddingScore,
    #[serde(default = "metric_comparer")]
    pub comparer: Comparer,
}

fn metric_comparer() -> Comparer {
    Comparer::Metric
}

/// Span text field addressed by an eval block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanField {
    Input,
    Output,
}

impl SpanField {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "input" => Ok(SpanField::Input),
            "output" => Ok(SpanField::Output),
            other => Err(EvalError::InvalidCase(format!("unknown span field '{other}'"))),
        }
    }

    pub fn read<'a>(&self, span: &'a SpanRecord) -> &'a str {
        match self {
            SpanField::Input => &span.input,
            SpanField::Output => &span.output,
        }
    }
}

/// Canned replacement for a pipeline tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockToolSpec {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,
    /// Response whose string values may hold `{{argument}}` placeholders
    pub response: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_telemetry::EntityType;

    const CASES: &str = r#"[
        {
            "test_input": ["Book a flight from San Francisco to Mumbai."],
            "test_output": "Flight booked from San Francisco to Mumbai.",
            "comparer": "similarity"
        },
        {
            "test_input": ["Book a flight from San Francisco to Mumbai."],
            "mock_tools": [{"name": "book_flight", "type": "tool.function",
                            "response": {"status": "success", "message": "Flight booked from {{from_airport}}."}}],
            "test_spans": [
                {"span_type": "agentic.tool.invocation",
                 "entities": [{"type": "tool", "name": "book_flight"},
                              {"type": "agent", "name": "flight_booking_agent"}],
                 "expect_errors": false},
                {"span_type": "agentic.turn",
                 "eval": {"eval": "bert_score", "args": ["output", "input"],
                          "expected_result": {"Precision": 0.5, "Recall": 0.5, "F1": 0.5}}}
            ]
        }
    ]"#;

    #[test]
    fn test_parse_cases() {
        let cases: Vec<TestCase> = serde_json::from_str(CASES).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].comparer, Comparer::Similarity);
        assert!(cases[0].test_spans.is_empty());

        let spans = &cases[1].test_spans;
        assert_eq!(spans[0].span_type, SpanKind::ToolInvocation);
        assert_eq!(spans[0].entities[1].entity_type, EntityType::Agent);
        assert_eq!(spans[0].expect_errors, Some(false));

        let eval = spans[1].eval.as_ref().unwrap();
        assert_eq!(eval.comparer, Comparer::Metric);
        assert_eq!(eval.expected_result.f1, 0.5);
        assert_eq!(cases[1].mock_tools[0].tool_type.as_deref(), Some("tool.function"));
        for case in &cases {
            case.check().unwrap();
        }
    }

    #[test]
    fn test_check_rejects_bad_cases() {
        assert!(TestCase::default().check().is_err());

        let mut case = TestCase::new("Book a hotel");
        case.comparer = Comparer::Metric;
        assert!(case.check().is_err());

        let mut span = SpanExpectation::new(SpanKind::Turn);
        span.eval = Some(SpanEval {
            eval: "bert_score".into(),
            args: vec!["input".into(), "summary".into()],
            expected_result: EmbeddingScore::default(),
            comparer: Comparer::Metric,
        });
        let err = TestCase::new("Book a hotel").with_span(span).check().unwrap_err();
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn test_selects_matches_entity_subset() {
        let span = SpanRecord {
            seq: 3,
            parent: Some(2),
            kind: SpanKind::ToolInvocation,
            entities: vec![
                Entity { entity_type: EntityType::Tool, name: "book_hotel".into() },
                Entity { entity_type: EntityType::Agent, name: "hotel_booking_agent".into() },
            ],
            input: String::new(),
            output: String::new(),
            error: false,
            duration_nanos: 0,
            attributes: Default::default(),
        };
        let expected = SpanExpectation::new(SpanKind::ToolInvocation)
            .with_entity(Entity { entity_type: EntityType::Tool, name: "book_hotel".into() });
        assert!(expected.selects(&span));
        assert_eq!(expected.label(), "agentic.tool.invocation [book_hotel]");

        let wrong = SpanExpectation::new(SpanKind::ToolInvocation)
            .with_entity(Entity { entity_type: EntityType::Tool, name: "book_flight".into() });
        assert!(!wrong.selects(&span));
    }

    #[test]
    fn test_load_all_reads_single_object() {
        let path = std::env::temp_dir().join(format!("trip-eval-case-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"test_input": ["Book a flight to Mumbai"]}"#).unwrap();
        let cases = TestCase::load_all(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].test_input, vec!["Book a flight to Mumbai"]);
    }
}

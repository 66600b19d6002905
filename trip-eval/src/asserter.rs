//! Fluent assertions over a captured trace
//!
//! ```rust,ignore
//! let trace = TraceAsserter::from_collector(&collector);
//! trace
//!     .called_tool("book_flight", "flight_booking_agent")
//!     .contains_input("San Francisco")
//!     .contains_output("success")
//!     .has_no_error();
//! ```
//!
//! Each step narrows the set of matching spans and panics when none is left,
//! so a chain passes when at least one span satisfies every step.

use trip_telemetry::{SpanKind, SpanRecord, TraceCollector};

use crate::criteria::ResponseMatchConfig;
use crate::scoring::ResponseScorer;

/// Entry point for trace assertions
#[derive(Debug, Clone)]
pub struct TraceAsserter {
    spans: Vec<SpanRecord>,
}

impl TraceAsserter {
    pub fn new(spans: Vec<SpanRecord>) -> Self {
        Self { spans }
    }

    pub fn from_collector(collector: &TraceCollector) -> Self {
        Self::new(collector.spans())
    }

    pub fn spans(&self) -> &[SpanRecord] {
        &self.spans
    }

    /// Tool spans for `tool` invoked by `agent`
    #[track_caller]
    pub fn called_tool(&self, tool: &str, agent: &str) -> SpanAssertion {
        let matches = self.select(SpanKind::ToolInvocation, |s| {
            s.tool_name() == Some(tool) && s.agent_name() == Some(agent)
        });
        SpanAssertion::new(format!("tool '{tool}' called by '{agent}'"), matches)
    }

    /// Invocation spans of `agent`
    #[track_caller]
    pub fn called_agent(&self, agent: &str) -> SpanAssertion {
        let matches = self.select(SpanKind::AgentInvocation, |s| s.agent_name() == Some(agent));
        SpanAssertion::new(format!("agent '{agent}'"), matches)
    }

    /// Root turn spans
    #[track_caller]
    pub fn turn(&self) -> SpanAssertion {
        SpanAssertion::new("turn".to_string(), self.select(SpanKind::Turn, |_| true))
    }

    /// Number of tool spans for `tool`, whichever agent called it
    pub fn tool_call_count(&self, tool: &str) -> usize {
        self.spans
            .iter()
            .filter(|s| s.kind == SpanKind::ToolInvocation && s.tool_name() == Some(tool))
            .count()
    }

    #[track_caller]
    pub fn did_not_call_tool(&self, tool: &str) -> &Self {
        let count = self.tool_call_count(tool);
        assert!(count == 0, "expected no call to tool '{tool}', found {count}");
        self
    }

    /// Agent names in the order their invocation spans started
    pub fn agent_order(&self) -> Vec<&str> {
        self.spans
            .iter()
            .filter(|s| s.kind == SpanKind::AgentInvocation)
            .filter_map(|s| s.agent_name())
            .collect()
    }

    fn select(&self, kind: SpanKind, pred: impl Fn(&SpanRecord) -> bool) -> Vec<SpanRecord> {
        self.spans.iter().filter(|s| s.kind == kind && pred(s)).cloned().collect()
    }
}

/// A narrowing set of spans that matched the assertions so far
#[derive(Debug, Clone)]
pub struct SpanAssertion {
    description: String,
    matches: Vec<SpanRecord>,
}

impl SpanAssertion {
    #[track_caller]
    fn new(description: String, matches: Vec<SpanRecord>) -> Self {
        assert!(!matches.is_empty(), "no span found for {description}");
        Self { description, matches }
    }

    #[track_caller]
    fn narrow(self, step: String, pred: impl Fn(&SpanRecord) -> bool) -> Self {
        let remaining: Vec<SpanRecord> = self.matches.iter().filter(|s| pred(s)).cloned().collect();
        if remaining.is_empty() {
            let seen: Vec<String> = self
                .matches
                .iter()
                .map(|s| format!("input={:?} output={:?}", s.input, s.output))
                .collect();
            panic!("{} failed {}; candidates:\n  {}", self.description, step, seen.join("\n  "));
        }
        Self { description: self.description, matches: remaining }
    }

    #[track_caller]
    pub fn contains_input(self, fragment: &str) -> Self {
        self.narrow(format!("contains_input({fragment:?})"), |s| s.input.contains(fragment))
    }

    #[track_caller]
    pub fn contains_output(self, fragment: &str) -> Self {
        self.narrow(format!("contains_output({fragment:?})"), |s| s.output.contains(fragment))
    }

    /// Output scores at least `threshold` against `expected` (ROUGE-L)
    #[track_caller]
    pub fn output_similar_to(self, expected: &str, threshold: f64) -> Self {
        let scorer = ResponseScorer::with_config(ResponseMatchConfig::similarity());
        self.narrow(format!("output_similar_to({expected:?}, {threshold})"), |s| {
            scorer.score(expected, &s.output) >= threshold
        })
    }

    #[track_caller]
    pub fn has_no_error(self) -> Self {
        self.narrow("has_no_error()".to_string(), |s| !s.error)
    }

    #[track_caller]
    pub fn has_error(self) -> Self {
        self.narrow("has_error()".to_string(), |s| s.error)
    }

    /// Exactly `n` spans still match
    #[track_caller]
    pub fn count_is(self, n: usize) -> Self {
        let count = self.matches.len();
        assert!(count == n, "{}: expected {n} matching spans, found {count}", self.description);
        self
    }

    pub fn spans(&self) -> &[SpanRecord] {
        &self.matches
    }

    pub fn first(&self) -> &SpanRecord {
        &self.matches[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_telemetry::Entity;

    fn span(
        seq: u64,
        kind: SpanKind,
        tool: Option<&str>,
        agent: &str,
        input: &str,
        output: &str,
    ) -> SpanRecord {
        let mut entities = Vec::new();
        if let Some(tool) = tool {
            entities.push(Entity::tool(tool));
        }
        entities.push(Entity::agent(agent));
        SpanRecord {
            seq,
            parent: seq.checked_sub(1),
            kind,
            entities,
            input: input.into(),
            output: output.into(),
            error: false,
            duration_nanos: 0,
            attributes: Default::default(),
        }
    }

    const REQUEST: &str = "Book a flight to Mumbai";

    fn trace() -> TraceAsserter {
        TraceAsserter::new(vec![
            span(0, SpanKind::Turn, None, "supervisor_agent", REQUEST, "Booked."),
            span(1, SpanKind::AgentInvocation, None, "supervisor_agent", REQUEST, "Booked."),
            span(
                2,
                SpanKind::AgentInvocation,
                None,
                "flight_booking_agent",
                REQUEST,
                "Flight booked.",
            ),
            span(
                3,
                SpanKind::ToolInvocation,
                Some("book_flight"),
                "flight_booking_agent",
                r#"{"from_airport":"San Francisco","to_airport":"Mumbai"}"#,
                r#"{"message":"Flight booked from San Francisco to Mumbai.","status":"success"}"#,
            ),
        ])
    }

    #[test]
    fn test_called_tool_chain() {
        trace()
            .called_tool("book_flight", "flight_booking_agent")
            .contains_input("San Francisco")
            .contains_output("success")
            .output_similar_to("Flight booked from San Francisco to Mumbai", 0.5)
            .has_no_error()
            .count_is(1);
    }

    #[test]
    fn test_agent_order_and_missing_tool() {
        let trace = trace();
        assert_eq!(trace.agent_order(), vec!["supervisor_agent", "flight_booking_agent"]);
        trace.did_not_call_tool("book_hotel");
        assert_eq!(trace.tool_call_count("book_flight"), 1);
        trace.turn().contains_output("Booked");
    }

    #[test]
    #[should_panic(expected = "no span found for tool 'book_hotel'")]
    fn test_missing_tool_panics() {
        trace().called_tool("book_hotel", "hotel_booking_agent");
    }

    #[test]
    #[should_panic(expected = "contains_output(\"Boston\")")]
    fn test_failed_step_names_the_step() {
        trace().called_agent("flight_booking_agent").contains_output("Boston");
    }
}

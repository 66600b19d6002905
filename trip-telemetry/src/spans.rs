//! Span helpers for the agentic trace shape
//!
//! Every run produces one `agentic.turn` root, one `agentic.invocation` span
//! per agent and one `agentic.tool.invocation` span per tool call. The
//! `input`, `output` and `error` fields are declared empty and recorded once
//! the unit of work finishes.

use tracing::Span;
use tracing::field::Empty;

/// Value of the `span.kind` field on a pipeline turn span.
pub const TURN_KIND: &str = "agentic.turn";
/// Value of the `span.kind` field on an agent invocation span.
pub const AGENT_INVOCATION_KIND: &str = "agentic.invocation";
/// Value of the `span.kind` field on a tool invocation span.
pub const TOOL_INVOCATION_KIND: &str = "agentic.tool.invocation";

/// Create the root span for one pipeline turn
///
/// # Example
/// ```
/// use trip_telemetry::turn_span;
/// let span = turn_span("supervisor_agent", "session-1", "Book a flight to Mumbai");
/// let _enter = span.enter();
/// ```
pub fn turn_span(agent_name: &str, session_id: &str, input: &str) -> Span {
    tracing::info_span!(
        parent: None,
        "agentic.turn",
        span.kind = TURN_KIND,
        agent.name = agent_name,
        session.id = session_id,
        input = input,
        output = Empty,
        error = Empty,
        otel.kind = "server"
    )
}

/// Create a span for one agent invocation, nested under the current span
pub fn agent_invocation_span(agent_name: &str, input: &str) -> Span {
    tracing::info_span!(
        "agentic.invocation",
        span.kind = AGENT_INVOCATION_KIND,
        agent.name = agent_name,
        input = input,
        output = Empty,
        error = Empty,
        otel.kind = "internal"
    )
}

/// Create a span for a tool call made by `agent_name`
///
/// The parent is explicit: agent turns run inside streams, where the
/// contextual span is not the invoking agent's.
pub fn tool_invocation_span(parent: &Span, tool_name: &str, agent_name: &str, input: &str) -> Span {
    tracing::info_span!(
        parent: parent,
        "agentic.tool.invocation",
        span.kind = TOOL_INVOCATION_KIND,
        tool.name = tool_name,
        agent.name = agent_name,
        input = input,
        output = Empty,
        error = Empty,
        otel.kind = "internal"
    )
}

/// Create a span for a model API call
pub fn model_call_span(parent: &Span, model_name: &str) -> Span {
    tracing::debug_span!(
        parent: parent,
        "model.call",
        model.name = model_name,
        otel.kind = "client"
    )
}

pub fn record_output(span: &Span, output: &str) {
    span.record("output", output);
}

pub fn record_error(span: &Span) {
    span.record("error", true);
}

use crate::{InvocationContext, Result, event::Event};
use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event>> + Send>>;

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn sub_agents(&self) -> &[Arc<dyn Agent>];

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream>;
}

/// A tool call made by an agent during its turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub args: serde_json::Value,
    pub response: serde_json::Value,
}

/// How one agent's turn ended.
///
/// Abstaining is a normal outcome: an agent whose domain is not part of the
/// request produces no text and the pipeline carries on.
///
/// A failing stage stops the run, so the pipeline returns
/// [`TripError::Stage`](crate::TripError::Stage) through `Result` and never
/// reports `Errored` itself. `Errored` is for callers that record a failed
/// stage alongside finished ones, see [`AgentOutcome::from_error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AgentOutcome {
    Acted { text: String, tool_calls: Vec<ToolCallRecord> },
    Abstained { tool_calls: Vec<ToolCallRecord> },
    Errored { message: String },
}

impl AgentOutcome {
    /// Classifies a finished turn from its final text and the tools it called.
    pub fn from_turn(text: Option<String>, tool_calls: Vec<ToolCallRecord>) -> Self {
        match text {
            Some(text) if !text.trim().is_empty() => AgentOutcome::Acted { text, tool_calls },
            _ => AgentOutcome::Abstained { tool_calls },
        }
    }

    /// Records a failed stage, unwrapping the stage attribution from `err`.
    pub fn from_error(err: &crate::TripError) -> Self {
        let message = match err {
            crate::TripError::Stage { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        AgentOutcome::Errored { message }
    }

    pub fn text(&self) -> &str {
        match self {
            AgentOutcome::Acted { text, .. } => text,
            _ => "",
        }
    }

    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        match self {
            AgentOutcome::Acted { tool_calls, .. } | AgentOutcome::Abstained { tool_calls } => {
                tool_calls
            }
            AgentOutcome::Errored { .. } => &[],
        }
    }

    pub fn is_abstained(&self) -> bool {
        matches!(self, AgentOutcome::Abstained { .. })
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, AgentOutcome::Errored { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_stream::stream;

    struct TestAgent {
        name: String,
    }

    #[async_trait]
    impl Agent for TestAgent {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "test agent"
        }

        fn sub_agents(&self) -> &[Arc<dyn Agent>] {
            &[]
        }

        async fn run(&self, _ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
            let s = stream! {
                yield Ok(Event::new("test"));
            };
            Ok(Box::pin(s))
        }
    }

    #[test]
    fn test_agent_trait() {
        let agent = TestAgent { name: "test".to_string() };
        assert_eq!(agent.name(), "test");
        assert_eq!(agent.description(), "test agent");
        assert!(agent.sub_agents().is_empty());
    }

    #[test]
    fn test_outcome_from_turn() {
        let acted = AgentOutcome::from_turn(Some("Flight booked.".to_string()), vec![]);
        assert_eq!(acted.text(), "Flight booked.");

        let silent = AgentOutcome::from_turn(Some("  \n".to_string()), vec![]);
        assert!(silent.is_abstained());
        assert_eq!(silent.text(), "");

        assert!(AgentOutcome::from_turn(None, vec![]).is_abstained());
    }

    #[test]
    fn test_outcome_from_stage_error() {
        let err = crate::TripError::Model("timeout".to_string()).in_stage("flight_booking_agent");
        let outcome = AgentOutcome::from_error(&err);
        assert_eq!(outcome, AgentOutcome::Errored { message: "Model error: timeout".to_string() });
        assert_eq!(outcome.text(), "");

        let plain = AgentOutcome::from_error(&crate::TripError::Tool("bad args".to_string()));
        assert_eq!(plain, AgentOutcome::Errored { message: "Tool error: bad args".to_string() });
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = AgentOutcome::Errored { message: "timeout".to_string() };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "errored");
        assert!(outcome.is_errored());
        assert!(outcome.tool_calls().is_empty());
    }
}

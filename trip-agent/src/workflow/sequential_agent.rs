use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use trip_core::{Agent, EventStream, InvocationContext, Result};
use trip_telemetry::{Instrument, agent_invocation_span, record_error, record_output};

/// Sequential agent executes sub-agents once in order
///
/// A sub-agent starts only after the previous one's event stream is
/// exhausted. The first error stops the sequence and is tagged with the name
/// of the stage that raised it.
pub struct SequentialAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self { name: name.into(), description: String::new(), sub_agents }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &self.sub_agents
    }

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
        let span = agent_invocation_span(&self.name, &ctx.user_content().text());
        tracing::info!(
            parent: &span,
            agent.name = %self.name,
            stages = self.sub_agents.len(),
            "Starting sequence"
        );

        let sub_agents = self.sub_agents.clone();

        let s = stream! {
            let mut last_text = String::new();

            for agent in sub_agents {
                let mut stream = match agent.run(ctx.clone()).instrument(span.clone()).await {
                    Ok(s) => s,
                    Err(e) => {
                        record_error(&span);
                        yield Err(e.in_stage(agent.name()));
                        return;
                    }
                };

                while let Some(result) = stream.next().await {
                    match result {
                        Ok(event) => {
                            if let Some(text) = event.final_text() {
                                last_text = text;
                            }
                            yield Ok(event);
                        }
                        Err(e) => {
                            record_error(&span);
                            yield Err(e.in_stage(agent.name()));
                            return;
                        }
                    }
                }
            }

            record_output(&span, &last_text);
        };

        Ok(Box::pin(s))
    }
}

use crate::{InvocationContext, MutableSession};
use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;
use trip_core::{Agent, Content, Event, EventStream, LlmResponse, Result};
use trip_session::{GetRequest, SessionService};
use trip_telemetry::{Instrument, record_error, record_output, turn_span};

pub struct RunnerConfig {
    pub app_name: String,
    pub agent: Arc<dyn Agent>,
    pub session_service: Arc<dyn SessionService>,
}

pub struct Runner {
    app_name: String,
    root_agent: Arc<dyn Agent>,
    session_service: Arc<dyn SessionService>,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        Ok(Self {
            app_name: config.app_name,
            root_agent: config.agent,
            session_service: config.session_service,
        })
    }

    pub fn root_agent(&self) -> &Arc<dyn Agent> {
        &self.root_agent
    }

    /// Run the root agent for one user turn
    ///
    /// Every event is persisted to the session before it is yielded, and its
    /// state delta is visible to agents that run after it. The whole turn is
    /// traced under one `agentic.turn` span.
    pub async fn run(
        &self,
        user_id: String,
        session_id: String,
        user_content: Content,
    ) -> Result<EventStream> {
        let app_name = self.app_name.clone();
        let session_service = self.session_service.clone();
        let root_agent = self.root_agent.clone();

        let s = stream! {
            let snapshot = match session_service
                .get(GetRequest {
                    app_name: app_name.clone(),
                    user_id: user_id.clone(),
                    session_id: session_id.clone(),
                })
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let span = turn_span(root_agent.name(), &session_id, &user_content.text());
            let invocation_id = format!("inv-{}", uuid::Uuid::new_v4());
            let session = Arc::new(MutableSession::new(&snapshot));
            let ctx = Arc::new(InvocationContext::new(
                invocation_id.clone(),
                root_agent.clone(),
                user_content.clone(),
                session.clone(),
            ));

            let mut user_event = Event::new(&invocation_id).with_author("user");
            user_event.llm_response = LlmResponse::new(user_content.clone());
            if let Err(e) = session_service.append_event(&session_id, user_event).await {
                record_error(&span);
                yield Err(e);
                return;
            }

            let mut agent_stream = match root_agent.run(ctx).instrument(span.clone()).await {
                Ok(s) => s,
                Err(e) => {
                    record_error(&span);
                    yield Err(e);
                    return;
                }
            };

            let mut last_text = String::new();
            while let Some(result) = agent_stream.next().await {
                match result {
                    Ok(event) => {
                        session.apply_state_delta(&event.actions.state_delta);
                        if let Some(text) = event.final_text() {
                            last_text = text;
                        }
                        let appended = session_service.append_event(&session_id, event.clone()).await;
                        if let Err(e) = appended {
                            record_error(&span);
                            yield Err(e);
                            return;
                        }
                        yield Ok(event);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Turn failed");
                        record_error(&span);
                        yield Err(e);
                        return;
                    }
                }
            }
            record_output(&span, &last_text);
        };

        Ok(Box::pin(s))
    }
}

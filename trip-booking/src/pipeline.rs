//! The supervisor pipeline: flight, hotel, then trip summary
//!
//! ```rust,ignore
//! let pipeline = PipelineBuilder::new(PipelineConfig::from_env()?).build()?;
//! let run = pipeline.run("Book a flight from San Francisco to Mumbai.").await?;
//! println!("{}", run.output);
//! ```

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use trip_agent::{LlmAgentBuilder, SequentialAgent};
use trip_core::{
    Agent, AgentOutcome, Content, Event, Llm, Part, Result, Tool, ToolCallRecord, TripError,
};
use trip_model::GeminiModel;
use trip_runner::{Runner, RunnerConfig};
use trip_session::{CreateRequest, DeleteRequest, InMemorySessionService, SessionService};
use trip_tool::MockTool;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::instructions::{
    FLIGHT_AGENT_DESCRIPTION, HOTEL_AGENT_DESCRIPTION, SUMMARY_AGENT_DESCRIPTION,
    SUPERVISOR_DESCRIPTION,
};
use crate::tools::{book_flight_tool, book_hotel_tool};

pub const FLIGHT_AGENT: &str = "flight_booking_agent";
pub const HOTEL_AGENT: &str = "hotel_booking_agent";
pub const SUMMARY_AGENT: &str = "trip_summary_agent";
pub const SUPERVISOR_AGENT: &str = "supervisor_agent";

/// Output slot written by the flight agent
pub const FLIGHT_SLOT: &str = "flight_booking";
/// Output slot written by the hotel agent
pub const HOTEL_SLOT: &str = "hotel_booking";
/// Output slot written by the summary agent
pub const SUMMARY_SLOT: &str = "booking_summary";

/// Assembles a [`TravelPipeline`]
pub struct PipelineBuilder {
    config: PipelineConfig,
    model: Option<Arc<dyn Llm>>,
    session_service: Option<Arc<dyn SessionService>>,
    overrides: Vec<Arc<dyn Tool>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, model: None, session_service: None, overrides: Vec::new() }
    }

    /// Model shared by every agent. Defaults to Gemini built from the config.
    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn session_service(mut self, service: Arc<dyn SessionService>) -> Self {
        self.session_service = Some(service);
        self
    }

    /// Replace the pipeline tool with the same name
    pub fn override_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.overrides.push(tool);
        self
    }

    /// Replace tool `name` with a canned, templated response
    pub fn mock_tool(self, name: &str, response: Value) -> Result<Self> {
        let original = default_tools()
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| TripError::Config(format!("no pipeline tool named '{name}' to mock")))?;
        Ok(self.override_tool(Arc::new(MockTool::replacing(original.as_ref(), response))))
    }

    pub fn build(self) -> Result<TravelPipeline> {
        let config = self.config;
        let tokens = i32::try_from(config.effective_max_output_tokens()).unwrap_or(i32::MAX);

        let model = match self.model {
            Some(model) => model,
            None => {
                let api_key = config.api_key.clone().ok_or_else(|| {
                    TripError::Config("GOOGLE_API_KEY or GEMINI_API_KEY must be set".to_string())
                })?;
                Arc::new(GeminiModel::new(api_key, &config.model)?.with_max_output_tokens(tokens))
            }
        };

        let mut tools: HashMap<String, Arc<dyn Tool>> =
            default_tools().into_iter().map(|t| (t.name().to_string(), t)).collect();
        for tool in self.overrides {
            if !tools.contains_key(tool.name()) {
                return Err(TripError::Config(format!(
                    "cannot override unknown tool '{}'",
                    tool.name()
                )));
            }
            tools.insert(tool.name().to_string(), tool);
        }
        let take = |name: &str| {
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| TripError::Config(format!("missing pipeline tool '{name}'")))
        };
        let flight_tool = take(crate::tools::BOOK_FLIGHT)?;
        let hotel_tool = take(crate::tools::BOOK_HOTEL)?;

        check_unique_names(
            [FLIGHT_AGENT, HOTEL_AGENT, SUMMARY_AGENT, SUPERVISOR_AGENT]
                .into_iter()
                .chain([flight_tool.name(), hotel_tool.name()]),
        )?;

        let profile = config.profile;
        let flight = LlmAgentBuilder::new(FLIGHT_AGENT)
            .description(FLIGHT_AGENT_DESCRIPTION)
            .model(model.clone())
            .instruction(profile.flight_instruction())
            .max_output_tokens(tokens)
            .tool(flight_tool)
            .output_key(FLIGHT_SLOT)
            .build()?;

        let hotel = LlmAgentBuilder::new(HOTEL_AGENT)
            .description(HOTEL_AGENT_DESCRIPTION)
            .model(model.clone())
            .instruction(profile.hotel_instruction())
            .max_output_tokens(tokens)
            .tool(hotel_tool)
            .output_key(HOTEL_SLOT)
            .build()?;

        let summary = LlmAgentBuilder::new(SUMMARY_AGENT)
            .description(SUMMARY_AGENT_DESCRIPTION)
            .model(model)
            .instruction(profile.summary_instruction())
            .max_output_tokens(tokens)
            .input_slots([FLIGHT_SLOT, HOTEL_SLOT])
            .output_key(SUMMARY_SLOT)
            .build()?;

        let supervisor: Arc<dyn Agent> = Arc::new(
            SequentialAgent::new(
                SUPERVISOR_AGENT,
                vec![Arc::new(flight), Arc::new(hotel), Arc::new(summary)],
            )
            .with_description(SUPERVISOR_DESCRIPTION),
        );

        let session_service =
            self.session_service.unwrap_or_else(|| Arc::new(InMemorySessionService::new()));
        let runner = Runner::new(RunnerConfig {
            app_name: config.app_name.clone(),
            agent: supervisor,
            session_service: session_service.clone(),
        })?;

        Ok(TravelPipeline { config, runner, session_service })
    }
}

fn default_tools() -> Vec<Arc<dyn Tool>> {
    vec![book_flight_tool(), book_hotel_tool()]
}

/// Agent and tool names share one namespace within a pipeline
fn check_unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TripError::Config(format!("name '{name}' is used more than once")));
        }
    }
    Ok(())
}

/// One stage's result within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub agent: String,
    pub outcome: AgentOutcome,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub session_id: String,
    /// Final text of the last stage; empty when the summary abstained
    pub output: String,
    /// Sub-agent results in execution order
    pub stages: Vec<StageReport>,
}

impl PipelineRun {
    pub fn outcome(&self, agent: &str) -> Option<&AgentOutcome> {
        self.stages.iter().find(|s| s.agent == agent).map(|s| &s.outcome)
    }

    /// Every tool call made during the run, in order
    pub fn tool_calls(&self) -> Vec<&ToolCallRecord> {
        self.stages.iter().flat_map(|s| s.outcome.tool_calls()).collect()
    }
}

/// A ready-to-run travel-booking pipeline
pub struct TravelPipeline {
    config: PipelineConfig,
    runner: Runner,
    session_service: Arc<dyn SessionService>,
}

impl TravelPipeline {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn root_agent(&self) -> &Arc<dyn Agent> {
        self.runner.root_agent()
    }

    /// Run the request through every stage in a fresh session
    pub async fn run(&self, request: &str) -> Result<PipelineRun> {
        self.run_in_session(request, uuid::Uuid::new_v4().to_string()).await
    }

    /// Like [`run`](Self::run) with a caller-chosen session id, so the run's
    /// trace can be found by its `session.id` attribute
    pub async fn run_in_session(&self, request: &str, session_id: String) -> Result<PipelineRun> {
        if request.trim().is_empty() {
            return Err(TripError::InvalidInput("request must not be empty".to_string()));
        }

        let session = self
            .session_service
            .create(CreateRequest {
                app_name: self.config.app_name.clone(),
                user_id: self.config.user_id.clone(),
                session_id: Some(session_id),
                state: HashMap::new(),
            })
            .await?;
        info!(session.id = %session.id, profile = %self.config.profile, "Running travel pipeline");

        let result = self.drive(request, &session.id).await;

        if let Err(e) = self
            .session_service
            .delete(DeleteRequest {
                app_name: self.config.app_name.clone(),
                user_id: self.config.user_id.clone(),
                session_id: session.id.clone(),
            })
            .await
        {
            warn!(session.id = %session.id, error = %e, "Failed to delete session");
        }

        match result {
            Ok(tracker) => {
                let (output, stages) = tracker.finish();
                info!(
                    session.id = %session.id,
                    output_len = output.len(),
                    "Travel pipeline finished"
                );
                Ok(PipelineRun { session_id: session.id, output, stages })
            }
            Err(e) => {
                error!(
                    session.id = %session.id,
                    stage = e.stage().unwrap_or("-"),
                    error = %e,
                    "Travel pipeline failed"
                );
                Err(e)
            }
        }
    }

    async fn drive(&self, request: &str, session_id: &str) -> Result<StageTracker> {
        let content = Content::new("user").with_text(request);
        let mut events = self
            .runner
            .run(self.config.user_id.clone(), session_id.to_string(), content)
            .await?;

        let mut tracker = StageTracker::default();
        while let Some(event) = events.next().await {
            tracker.observe(&event?);
        }
        Ok(tracker)
    }
}

/// Folds the event stream into per-stage outcomes
#[derive(Default)]
struct StageTracker {
    stages: Vec<Stage>,
    output: String,
}

struct Stage {
    agent: String,
    text: Option<String>,
    pending: Vec<(String, Value)>,
    calls: Vec<ToolCallRecord>,
}

impl StageTracker {
    fn observe(&mut self, event: &Event) {
        if event.author == "user" {
            return;
        }
        if self.stages.last().is_none_or(|s| s.agent != event.author) {
            self.stages.push(Stage {
                agent: event.author.clone(),
                text: None,
                pending: Vec::new(),
                calls: Vec::new(),
            });
        }
        let Some(stage) = self.stages.last_mut() else { return };

        if let Some(content) = event.content() {
            for part in &content.parts {
                match part {
                    Part::FunctionCall { name, args, .. } => {
                        stage.pending.push((name.clone(), args.clone()));
                    }
                    Part::FunctionResponse { function_response, .. } => {
                        let position = stage
                            .pending
                            .iter()
                            .position(|(name, _)| *name == function_response.name);
                        if let Some(index) = position {
                            let (name, args) = stage.pending.remove(index);
                            stage.calls.push(ToolCallRecord {
                                name,
                                args,
                                response: function_response.response.clone(),
                            });
                        }
                    }
                    Part::Text { .. } => {}
                }
            }
        }

        if let Some(text) = event.final_text() {
            self.output = text.clone();
            stage.text = Some(text);
        }
    }

    /// The run's output and each stage's outcome
    fn finish(self) -> (String, Vec<StageReport>) {
        let stages = self
            .stages
            .into_iter()
            .map(|s| StageReport {
                agent: s.agent,
                outcome: AgentOutcome::from_turn(s.text, s.calls),
            })
            .collect();
        (self.output, stages)
    }
}

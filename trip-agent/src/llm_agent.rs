use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use trip_core::{
    Agent, Content, Event, EventStream, GenerateContentConfig, InvocationContext, Llm, LlmRequest,
    LlmResponse, Part, ReadonlyContext, Result, Tool, ToolContext, TripError,
};
use trip_telemetry::{
    Instrument, agent_invocation_span, model_call_span, record_error, record_output,
    tool_invocation_span,
};

/// Placeholder used for an input slot that an upstream agent left empty.
pub const EMPTY_SLOT: &str = "(no action taken)";

const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Agent backed by a language model, with optional tools
///
/// Each run is isolated: the model sees the agent's instruction, one user
/// turn and the agent's own tool exchanges, never other agents' history.
pub struct LlmAgent {
    name: String,
    description: String,
    model: Arc<dyn Llm>,
    instruction: Option<String>,
    config: Option<GenerateContentConfig>,
    tools: Vec<Arc<dyn Tool>>,
    input_slots: Vec<String>,
    output_key: Option<String>,
    max_iterations: u32,
}

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("input_slots", &self.input_slots)
            .field("output_key", &self.output_key)
            .finish()
    }
}

pub struct LlmAgentBuilder {
    name: String,
    description: Option<String>,
    model: Option<Arc<dyn Llm>>,
    instruction: Option<String>,
    config: Option<GenerateContentConfig>,
    tools: Vec<Arc<dyn Tool>>,
    input_slots: Vec<String>,
    output_key: Option<String>,
    max_iterations: u32,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            model: None,
            instruction: None,
            config: None,
            tools: Vec::new(),
            input_slots: Vec::new(),
            output_key: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn generate_content_config(mut self, config: GenerateContentConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: i32) -> Self {
        self.config.get_or_insert_with(GenerateContentConfig::default).max_output_tokens =
            Some(max_output_tokens);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Build the user turn from these session slots instead of the request.
    pub fn input_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_slots = slots.into_iter().map(Into::into).collect();
        self
    }

    /// Session key the final text is written to.
    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let model = self.model.ok_or_else(|| TripError::Agent("Model is required".to_string()))?;

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name()) {
                return Err(TripError::Config(format!(
                    "Agent '{}' binds tool '{}' more than once",
                    self.name,
                    tool.name()
                )));
            }
        }

        Ok(LlmAgent {
            name: self.name,
            description: self.description.unwrap_or_default(),
            model,
            instruction: self.instruction,
            config: self.config,
            tools: self.tools,
            input_slots: self.input_slots,
            output_key: self.output_key,
            max_iterations: self.max_iterations.max(1),
        })
    }
}

impl LlmAgent {
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    /// The single user turn this agent sends to its model.
    pub fn user_turn(&self, ctx: &dyn InvocationContext) -> Content {
        if self.input_slots.is_empty() {
            return ctx.user_content().clone();
        }
        let text = self
            .input_slots
            .iter()
            .map(|slot| {
                let value = ctx.slot(slot).filter(|v| !v.trim().is_empty());
                format!("{}: {}", slot, value.as_deref().unwrap_or(EMPTY_SLOT))
            })
            .collect::<Vec<_>>()
            .join("\n");
        Content::new("user").with_text(text)
    }
}

struct AgentToolContext {
    parent_ctx: Arc<dyn InvocationContext>,
    agent_name: String,
    function_call_id: String,
}

impl ReadonlyContext for AgentToolContext {
    fn invocation_id(&self) -> &str {
        self.parent_ctx.invocation_id()
    }

    fn agent_name(&self) -> &str {
        &self.agent_name
    }

    fn user_id(&self) -> &str {
        self.parent_ctx.user_id()
    }

    fn app_name(&self) -> &str {
        self.parent_ctx.app_name()
    }

    fn session_id(&self) -> &str {
        self.parent_ctx.session_id()
    }

    fn user_content(&self) -> &Content {
        self.parent_ctx.user_content()
    }
}

impl ToolContext for AgentToolContext {
    fn function_call_id(&self) -> &str {
        &self.function_call_id
    }
}

/// Drain a model response stream into one response, merging partial chunks.
async fn complete_response(model: &dyn Llm, request: LlmRequest) -> Result<LlmResponse> {
    let mut stream = model.generate_content(request, false).await?;
    let mut merged: Option<LlmResponse> = None;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        match merged.as_mut() {
            None => merged = Some(chunk),
            Some(acc) => {
                if let Some(content) = chunk.content {
                    match acc.content.as_mut() {
                        Some(existing) => existing.parts.extend(content.parts),
                        None => acc.content = Some(content),
                    }
                }
                acc.finish_reason = chunk.finish_reason.or(acc.finish_reason);
                acc.usage_metadata = chunk.usage_metadata.or(acc.usage_metadata.take());
            }
        }
    }
    merged.ok_or_else(|| TripError::Model(format!("Model '{}' returned no response", model.name())))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &[]
    }

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
        let user_turn = self.user_turn(ctx.as_ref());
        let span = agent_invocation_span(&self.name, &user_turn.text());
        tracing::info!(parent: &span, agent.name = %self.name, "Starting agent execution");

        let agent_name = self.name.clone();
        let invocation_id = ctx.invocation_id().to_string();
        let model = self.model.clone();
        let tools = self.tools.clone();
        let instruction = self.instruction.clone();
        let config = self.config.clone();
        let output_key = self.output_key.clone();
        let max_iterations = self.max_iterations;
        let tool_declarations: BTreeMap<String, Value> =
            tools.iter().map(|t| (t.name().to_string(), t.declaration())).collect();

        let s = stream! {
            let mut history = vec![user_turn];
            let mut called: HashSet<String> = HashSet::new();
            let mut iteration = 0;

            let final_text = loop {
                iteration += 1;
                if iteration > max_iterations {
                    record_error(&span);
                    yield Err(TripError::Agent(format!(
                        "Agent '{}' exceeded {} model turns",
                        agent_name, max_iterations
                    )));
                    return;
                }

                let mut request = LlmRequest::new(model.name(), history.clone());
                request.system_instruction = instruction.clone();
                request.config = config.clone();
                request.tools = tool_declarations.clone();

                let response = match complete_response(model.as_ref(), request)
                    .instrument(model_call_span(&span, model.name()))
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::error!(
                            parent: &span,
                            agent.name = %agent_name,
                            error = %e,
                            "Model call failed"
                        );
                        record_error(&span);
                        yield Err(e);
                        return;
                    }
                };

                let content = response.content.unwrap_or_else(|| Content::new("model"));
                let calls: Vec<(String, Value)> = content
                    .function_calls()
                    .into_iter()
                    .map(|(name, args)| (name.to_string(), args.clone()))
                    .collect();
                if calls.is_empty() {
                    break content.text();
                }

                // Events carry only calls to bound tools; the model still sees every call.
                let mut bound_calls = Content::new(content.role.clone());
                bound_calls.parts = content
                    .parts
                    .iter()
                    .filter(|p| match p {
                        Part::FunctionCall { name, .. } => {
                            tools.iter().any(|t| t.name() == name.as_str())
                        }
                        _ => false,
                    })
                    .cloned()
                    .collect();
                history.push(content);
                if !bound_calls.parts.is_empty() {
                    let mut call_event = Event::new(&invocation_id).with_author(&agent_name);
                    call_event.set_content(bound_calls);
                    yield Ok(call_event);
                }

                let mut responses = Content::new("function");
                let mut ran = Content::new("function");
                for (name, args) in calls {
                    let Some(tool) = tools.iter().find(|t| t.name() == name) else {
                        tracing::warn!(
                            parent: &span,
                            tool.name = %name,
                            "Model called a tool this agent does not have"
                        );
                        responses.parts.push(Part::function_response(
                            name.clone(),
                            json!({ "error": format!("Tool '{}' not found", name) }),
                        ));
                        continue;
                    };

                    let tool_span =
                        tool_invocation_span(&span, &name, &agent_name, &args.to_string());
                    let result = if !called.insert(name.clone()) {
                        tracing::warn!(
                            parent: &span,
                            tool.name = %name,
                            "Tool already called this turn"
                        );
                        record_error(&tool_span);
                        let message = format!("Tool '{}' was already called in this turn", name);
                        json!({ "error": message })
                    } else {
                        let tool_ctx = Arc::new(AgentToolContext {
                            parent_ctx: ctx.clone(),
                            agent_name: agent_name.clone(),
                            function_call_id: format!("{}-{}", name, iteration),
                        }) as Arc<dyn ToolContext>;
                        let executed =
                            tool.execute(tool_ctx, args.clone()).instrument(tool_span.clone()).await;
                        match executed {
                            Ok(value) => value,
                            Err(e) => {
                                tracing::warn!(
                                    parent: &tool_span,
                                    error = %e,
                                    "Tool execution failed"
                                );
                                record_error(&tool_span);
                                json!({ "error": e.to_string() })
                            }
                        }
                    };
                    tracing::debug!(parent: &tool_span, tool.name = %name, "Tool returned");
                    record_output(&tool_span, &value_text(&result));
                    let part = Part::function_response(name, result);
                    ran.parts.push(part.clone());
                    responses.parts.push(part);
                }

                history.push(responses);
                if !ran.parts.is_empty() {
                    let mut response_event = Event::new(&invocation_id).with_author(&agent_name);
                    response_event.set_content(ran);
                    yield Ok(response_event);
                }
            };

            let final_text = final_text.trim().to_string();
            if final_text.is_empty() {
                tracing::warn!(parent: &span, agent.name = %agent_name, "Agent produced no output");
            }
            record_output(&span, &final_text);

            let mut event = Event::new(&invocation_id).with_author(&agent_name);
            event.llm_response = LlmResponse::text(final_text.clone());
            if let Some(key) = &output_key {
                event.actions.state_delta.insert(key.clone(), Value::String(final_text));
            }
            yield Ok(event);
        };

        Ok(Box::pin(s))
    }
}

use crate::spans::{AGENT_INVOCATION_KIND, TOOL_INVOCATION_KIND, TURN_KIND};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{Id, Subscriber, debug};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanKind {
    #[serde(rename = "agentic.turn")]
    Turn,
    #[serde(rename = "agentic.invocation")]
    AgentInvocation,
    #[serde(rename = "agentic.tool.invocation")]
    ToolInvocation,
}

impl SpanKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            TURN_KIND => Some(SpanKind::Turn),
            AGENT_INVOCATION_KIND => Some(SpanKind::AgentInvocation),
            TOOL_INVOCATION_KIND => Some(SpanKind::ToolInvocation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Turn => TURN_KIND,
            SpanKind::AgentInvocation => AGENT_INVOCATION_KIND,
            SpanKind::ToolInvocation => TOOL_INVOCATION_KIND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Agent,
    Tool,
}

/// Something a span is about: the agent that ran or the tool it called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
}

impl Entity {
    pub fn agent(name: impl Into<String>) -> Self {
        Self { entity_type: EntityType::Agent, name: name.into() }
    }

    pub fn tool(name: impl Into<String>) -> Self {
        Self { entity_type: EntityType::Tool, name: name.into() }
    }
}

/// A finished agentic span
///
/// `seq` follows span creation order, so sorting by it reproduces the order
/// in which agents and tools started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub seq: u64,
    pub parent: Option<u64>,
    pub kind: SpanKind,
    /// Tool first, then the agent, for tool spans. Just the agent otherwise.
    pub entities: Vec<Entity>,
    pub input: String,
    pub output: String,
    pub error: bool,
    pub duration_nanos: u64,
    pub attributes: BTreeMap<String, String>,
}

impl SpanRecord {
    pub fn agent_name(&self) -> Option<&str> {
        self.entity(EntityType::Agent)
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.entity(EntityType::Tool)
    }

    fn entity(&self, entity_type: EntityType) -> Option<&str> {
        self.entities.iter().find(|e| e.entity_type == entity_type).map(|e| e.name.as_str())
    }
}

/// Shared store of finished agentic spans
#[derive(Debug, Clone, Default)]
pub struct TraceCollector {
    spans: Arc<RwLock<Vec<SpanRecord>>>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured spans in creation order.
    pub fn spans(&self) -> Vec<SpanRecord> {
        let mut spans = match self.spans.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        spans.sort_by_key(|s| s.seq);
        spans
    }

    pub fn spans_of_kind(&self, kind: SpanKind) -> Vec<SpanRecord> {
        self.spans().into_iter().filter(|s| s.kind == kind).collect()
    }

    /// Spans belonging to the tree rooted at `root_seq`, root included.
    pub fn tree(&self, root_seq: u64) -> Vec<SpanRecord> {
        let spans = self.spans();
        let mut members = vec![root_seq];
        let mut tree = Vec::new();
        for span in spans {
            let in_tree =
                span.seq == root_seq || span.parent.is_some_and(|p| members.contains(&p));
            if in_tree {
                if span.seq != root_seq {
                    members.push(span.seq);
                }
                tree.push(span);
            }
        }
        tree
    }

    pub fn clear(&self) {
        match self.spans.write() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn push(&self, record: SpanRecord) {
        debug!(seq = record.seq, kind = record.kind.as_str(), "TraceCollector: storing span");
        match self.spans.write() {
            Ok(mut guard) => guard.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// Tracing layer that records spans carrying a `span.kind` field into a [`TraceCollector`]
pub struct TraceLayer {
    collector: TraceCollector,
    next_seq: AtomicU64,
}

impl TraceLayer {
    pub fn new(collector: TraceCollector) -> Self {
        Self { collector, next_seq: AtomicU64::new(0) }
    }
}

struct SpanFields(HashMap<String, String>);

struct SpanMeta {
    seq: u64,
    parent: Option<u64>,
    kind: SpanKind,
    start_time: std::time::Instant,
}

impl<S> Layer<S> for TraceLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };

        let mut visitor = StringVisitor::default();
        attrs.record(&mut visitor);
        let Some(kind) = visitor.0.get("span.kind").and_then(|k| SpanKind::parse(k)) else {
            return;
        };

        // Nearest recorded ancestor; unrecorded spans in between are skipped.
        let parent = span
            .scope()
            .skip(1)
            .find_map(|ancestor| {
                let extensions = ancestor.extensions();
                extensions.get::<SpanMeta>().map(|m| m.seq)
            });

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let mut extensions = span.extensions_mut();
        extensions.insert(SpanMeta { seq, parent, kind, start_time: std::time::Instant::now() });
        extensions.insert(SpanFields(visitor.0));
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = StringVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let extensions = span.extensions();
        let Some(meta) = extensions.get::<SpanMeta>() else { return };
        let mut fields = extensions.get::<SpanFields>().map(|f| f.0.clone()).unwrap_or_default();

        let mut entities = Vec::new();
        if let Some(tool) = fields.remove("tool.name") {
            entities.push(Entity::tool(tool));
        }
        if let Some(agent) = fields.remove("agent.name") {
            entities.push(Entity::agent(agent));
        }

        let record = SpanRecord {
            seq: meta.seq,
            parent: meta.parent,
            kind: meta.kind,
            entities,
            input: fields.remove("input").unwrap_or_default(),
            output: fields.remove("output").unwrap_or_default(),
            error: fields.remove("error").is_some_and(|e| e == "true"),
            duration_nanos: meta.start_time.elapsed().as_nanos() as u64,
            attributes: fields.into_iter().filter(|(k, _)| k != "span.kind").collect(),
        };
        self.collector.push(record);
    }
}

#[derive(Default)]
struct StringVisitor(HashMap<String, String>);

impl tracing::field::Visit for StringVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

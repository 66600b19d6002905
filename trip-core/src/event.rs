use crate::model::LlmResponse;
use crate::types::{Content, Part};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Event represents a single interaction produced while an agent runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub invocation_id: String,
    pub author: String,
    /// Access content via `event.content()`.
    #[serde(flatten)]
    pub llm_response: LlmResponse,
    pub actions: EventActions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventActions {
    /// Output slots written by the author, applied to session state.
    pub state_delta: HashMap<String, serde_json::Value>,
}

impl Event {
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            invocation_id: invocation_id.into(),
            author: String::new(),
            llm_response: LlmResponse::default(),
            actions: EventActions::default(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn content(&self) -> Option<&Content> {
        self.llm_response.content.as_ref()
    }

    pub fn set_content(&mut self, content: Content) {
        self.llm_response.content = Some(content);
    }

    /// True when this event carries the author's closing text for the turn.
    pub fn is_final_response(&self) -> bool {
        if self.llm_response.partial {
            return false;
        }
        match self.content() {
            Some(content) => content.parts.iter().all(|p| matches!(p, Part::Text { .. })),
            None => false,
        }
    }

    /// Text of a final response event.
    pub fn final_text(&self) -> Option<String> {
        if self.is_final_response() { self.content().map(Content::text) } else { None }
    }
}

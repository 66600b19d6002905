use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use trip_core::{Event, ReadonlyState, Session};

/// Point-in-time copy of a stored session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: StateMap,
    pub events: Vec<Event>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMap(pub HashMap<String, Value>);

impl ReadonlyState for StateMap {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }

    fn all(&self) -> HashMap<String, Value> {
        self.0.clone()
    }
}

impl Session for SessionSnapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn state(&self) -> &dyn ReadonlyState {
        &self.state
    }
}

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use trip_core::{
    Agent, Content, InvocationContext as InvocationContextTrait, ReadonlyContext, ReadonlyState,
    Session,
};
use trip_session::SessionSnapshot;

/// Session view shared by every agent in one run
///
/// State deltas are applied as events stream out, so a later agent reads
/// the slots written by earlier ones.
pub struct MutableSession {
    id: String,
    app_name: String,
    user_id: String,
    state: RwLock<HashMap<String, Value>>,
}

impl MutableSession {
    pub fn new(snapshot: &SessionSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            app_name: snapshot.app_name.clone(),
            user_id: snapshot.user_id.clone(),
            state: RwLock::new(snapshot.state.0.clone()),
        }
    }

    pub fn apply_state_delta(&self, delta: &HashMap<String, Value>) {
        if delta.is_empty() {
            return;
        }
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        for (key, value) in delta {
            state.insert(key.clone(), value.clone());
        }
    }
}

impl ReadonlyState for MutableSession {
    fn get(&self, key: &str) -> Option<Value> {
        self.state.read().unwrap_or_else(|p| p.into_inner()).get(key).cloned()
    }

    fn all(&self) -> HashMap<String, Value> {
        self.state.read().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Session for MutableSession {
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
        self
    }
}

pub struct InvocationContext {
    invocation_id: String,
    agent: Arc<dyn Agent>,
    user_content: Content,
    session: Arc<MutableSession>,
}

impl InvocationContext {
    pub fn new(
        invocation_id: String,
        agent: Arc<dyn Agent>,
        user_content: Content,
        session: Arc<MutableSession>,
    ) -> Self {
        Self { invocation_id, agent, user_content, session }
    }

    pub fn mutable_session(&self) -> &Arc<MutableSession> {
        &self.session
    }
}

impl ReadonlyContext for InvocationContext {
    fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    fn agent_name(&self) -> &str {
        self.agent.name()
    }

    fn user_id(&self) -> &str {
        &self.session.user_id
    }

    fn app_name(&self) -> &str {
        &self.session.app_name
    }

    fn session_id(&self) -> &str {
        &self.session.id
    }

    fn user_content(&self) -> &Content {
        &self.user_content
    }
}

impl InvocationContextTrait for InvocationContext {
    fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }
}

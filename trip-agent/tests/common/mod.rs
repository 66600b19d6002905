use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use trip_core::{Content, InvocationContext, ReadonlyContext, ReadonlyState, Session};

pub struct TestState(pub HashMap<String, Value>);

impl ReadonlyState for TestState {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }

    fn all(&self) -> HashMap<String, Value> {
        self.0.clone()
    }
}

pub struct TestSession {
    state: TestState,
}

impl Session for TestSession {
    fn id(&self) -> &str {
        "session-1"
    }

    fn app_name(&self) -> &str {
        "travel_booking_app"
    }

    fn user_id(&self) -> &str {
        "user_123"
    }

    fn state(&self) -> &dyn ReadonlyState {
        &self.state
    }
}

pub struct TestContext {
    content: Content,
    session: TestSession,
}

impl TestContext {
    pub fn new(request: &str) -> Self {
        Self::with_state(request, HashMap::new())
    }

    pub fn with_state(request: &str, state: HashMap<String, Value>) -> Self {
        Self {
            content: Content::new("user").with_text(request),
            session: TestSession { state: TestState(state) },
        }
    }

    pub fn shared(self) -> Arc<dyn InvocationContext> {
        Arc::new(self)
    }
}

impl ReadonlyContext for TestContext {
    fn invocation_id(&self) -> &str {
        "inv-1"
    }

    fn agent_name(&self) -> &str {
        "supervisor_agent"
    }

    fn user_id(&self) -> &str {
        "user_123"
    }

    fn app_name(&self) -> &str {
        "travel_booking_app"
    }

    fn session_id(&self) -> &str {
        "session-1"
    }

    fn user_content(&self) -> &Content {
        &self.content
    }
}

impl InvocationContext for TestContext {
    fn session(&self) -> &dyn Session {
        &self.session
    }
}

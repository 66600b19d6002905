use crate::{CreateRequest, DeleteRequest, GetRequest, SessionService, SessionSnapshot, StateMap};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use trip_core::{Event, Result, TripError};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SessionKey {
    app_name: String,
    user_id: String,
    session_id: String,
}

/// Process-local session store
///
/// Sessions live only as long as the service. Nothing is written to disk.
#[derive(Clone, Default)]
pub struct InMemorySessionService {
    sessions: Arc<RwLock<HashMap<SessionKey, SessionSnapshot>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SessionKey, SessionSnapshot>>> {
        self.sessions.read().map_err(|_| TripError::Session("session store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SessionKey, SessionSnapshot>>> {
        self.sessions.write().map_err(|_| TripError::Session("session store lock poisoned".into()))
    }

    pub fn len(&self) -> usize {
        self.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(&self, req: CreateRequest) -> Result<SessionSnapshot> {
        let session_id = req.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let key = SessionKey {
            app_name: req.app_name.clone(),
            user_id: req.user_id.clone(),
            session_id: session_id.clone(),
        };

        let snapshot = SessionSnapshot {
            id: session_id,
            app_name: req.app_name,
            user_id: req.user_id,
            state: StateMap(req.state),
            events: Vec::new(),
            updated_at: Utc::now(),
        };

        let mut sessions = self.write()?;
        if sessions.contains_key(&key) {
            return Err(TripError::Session(format!("session '{}' already exists", key.session_id)));
        }
        sessions.insert(key, snapshot.clone());
        tracing::debug!(session.id = %snapshot.id, "Session created");
        Ok(snapshot)
    }

    async fn get(&self, req: GetRequest) -> Result<SessionSnapshot> {
        let key = SessionKey {
            app_name: req.app_name,
            user_id: req.user_id,
            session_id: req.session_id,
        };
        self.read()?
            .get(&key)
            .cloned()
            .ok_or_else(|| TripError::Session(format!("session '{}' not found", key.session_id)))
    }

    async fn delete(&self, req: DeleteRequest) -> Result<()> {
        let key = SessionKey {
            app_name: req.app_name,
            user_id: req.user_id,
            session_id: req.session_id,
        };
        self.write()?.remove(&key);
        Ok(())
    }

    async fn append_event(&self, session_id: &str, event: Event) -> Result<()> {
        let mut sessions = self.write()?;
        let data = sessions
            .values_mut()
            .find(|d| d.id == session_id)
            .ok_or_else(|| TripError::Session(format!("session '{}' not found", session_id)))?;

        data.state.0.extend(event.actions.state_delta.clone());
        data.updated_at = event.timestamp;
        data.events.push(event);
        Ok(())
    }
}

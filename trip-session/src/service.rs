use crate::SessionSnapshot;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use trip_core::{Event, Result};

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub app_name: String,
    pub user_id: String,
    /// Generated when absent.
    pub session_id: Option<String>,
    pub state: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct GetRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create(&self, req: CreateRequest) -> Result<SessionSnapshot>;
    async fn get(&self, req: GetRequest) -> Result<SessionSnapshot>;
    async fn delete(&self, req: DeleteRequest) -> Result<()>;
    /// Record `event` and merge its state delta into the session state.
    async fn append_event(&self, session_id: &str, event: Event) -> Result<()>;
}

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use trip_core::{Llm, LlmRequest, LlmResponse, LlmResponseStream, Result, TripError};

type Handler = Box<dyn Fn(&LlmRequest) -> Result<LlmResponse> + Send + Sync>;

enum Behavior {
    Scripted(Mutex<VecDeque<LlmResponse>>),
    Handler(Handler),
}

/// Test model that replays scripted turns or answers through a closure
///
/// Every request it receives is kept for later inspection.
pub struct MockLlm {
    name: String,
    behavior: Behavior,
    requests: Mutex<Vec<LlmRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: Behavior::Scripted(Mutex::new(VecDeque::new())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer each request by calling `handler`.
    pub fn from_fn<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&LlmRequest) -> Result<LlmResponse> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            behavior: Behavior::Handler(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue the response for the next call. Ignored for closure-backed mocks.
    pub fn with_response(self, response: LlmResponse) -> Self {
        if let Behavior::Scripted(queue) = &self.behavior {
            lock(queue).push_back(response);
        }
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(&self, req: LlmRequest, _stream: bool) -> Result<LlmResponseStream> {
        let response = match &self.behavior {
            Behavior::Scripted(queue) => lock(queue).pop_front().ok_or_else(|| {
                TripError::Model(format!("MockLlm '{}' has no scripted response left", self.name))
            }),
            Behavior::Handler(handler) => handler(&req),
        };
        lock(&self.requests).push(req);

        let response = response?;
        let stream = async_stream::stream! {
            yield Ok(response);
        };
        Ok(Box::pin(stream))
    }
}

//! Gemini REST client.

use super::config::{GEMINI_API_BASE, GeminiConfig};
use super::convert::{self, GenerateContentRequest, GenerateContentResponse};
use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::Client;
use trip_core::{Llm, LlmRequest, LlmResponse, LlmResponseStream, Result, TripError};

/// Gemini model over the public `generateContent` REST API
///
/// # Example
///
/// ```rust,ignore
/// use trip_model::GeminiModel;
///
/// let model = GeminiModel::new(std::env::var("GOOGLE_API_KEY")?, "gemini-2.5-flash-lite")?;
/// ```
pub struct GeminiModel {
    client: Client,
    config: GeminiConfig,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::from_config(GeminiConfig::new(api_key, model))
    }

    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TripError::Config("Gemini API key is empty".to_string()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| TripError::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: i32) -> Self {
        self.config.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn api_url(&self, stream: bool) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(GEMINI_API_BASE);
        let method = if stream { "streamGenerateContent?alt=sse" } else { "generateContent" };
        format!("{}/models/{}:{}", base.trim_end_matches('/'), self.config.model, method)
    }

    fn build_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        convert::to_request(request, self.config.max_output_tokens)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(TripError::Model(format!("Gemini API error ({}): {}", status, error_text)))
}

/// Decode a `text/event-stream` body into responses, one per `data:` event
///
/// Events are split on raw bytes before UTF-8 decoding, so a character cut
/// across network chunks arrives intact.
fn sse_responses<S, B, E>(bytes: S) -> impl Stream<Item = Result<LlmResponse>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    try_stream! {
        let mut events = Box::pin(bytes.eventsource());
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| TripError::Model(format!("Stream read error: {}", e)))?;
            match serde_json::from_str::<GenerateContentResponse>(&event.data) {
                Ok(chunk_response) => {
                    let mut llm_response = convert::from_response(&chunk_response);
                    let done = llm_response.finish_reason.is_some();
                    llm_response.partial = !done;
                    llm_response.turn_complete = done;
                    yield llm_response;
                }
                Err(e) => {
                    tracing::warn!("Failed to parse Gemini chunk: {} - {}", e, event.data);
                }
            }
        }
    }
}

#[async_trait]
impl Llm for GeminiModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream> {
        let api_url = self.api_url(stream);
        let api_key = self.config.api_key.clone();
        let wire_request = self.build_request(&request);
        let client = self.client.clone();

        tracing::debug!(
            model = %self.config.model,
            contents = wire_request.contents.len(),
            tools = wire_request.tools.len(),
            stream,
            "Sending Gemini request"
        );

        let response_stream = try_stream! {
            let response = client
                .post(&api_url)
                .header("x-goog-api-key", api_key)
                .json(&wire_request)
                .send()
                .await
                .map_err(|e| TripError::Model(format!("Gemini API request failed: {}", e)))?;

            let response = ensure_success(response).await?;

            if stream {
                let mut chunks = Box::pin(sse_responses(response.bytes_stream()));
                while let Some(chunk) = chunks.next().await {
                    yield chunk?;
                }
            } else {
                let response_text = response.text().await
                    .map_err(|e| TripError::Model(format!("Failed to read response: {}", e)))?;

                let parsed: GenerateContentResponse = serde_json::from_str(&response_text)
                    .map_err(|e| TripError::Model(format!(
                        "Failed to parse response: {} - {}",
                        e, response_text
                    )))?;

                yield convert::from_response(&parsed);
            }
        };

        Ok(Box::pin(response_stream))
    }
}

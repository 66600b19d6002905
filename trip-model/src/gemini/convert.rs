//! Conversion between pipeline types and the `generateContent` wire format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trip_core::{
    Content, FinishReason, GenerateContentConfig, LlmRequest, LlmResponse, Part, UsageMetadata,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<WireFunctionResponse>,
    /// Set on reasoning parts, which are never surfaced as output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTool {
    pub function_declarations: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<WireContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_token_count: i32,
    #[serde(default)]
    pub candidates_token_count: i32,
    #[serde(default)]
    pub total_token_count: i32,
}

/// Build the wire request. `default_max_tokens` applies when the request has no cap.
pub fn to_request(request: &LlmRequest, default_max_tokens: Option<i32>) -> GenerateContentRequest {
    let contents = request.contents.iter().map(content_to_wire).collect();

    let system_instruction = request.system_instruction.as_ref().map(|text| WireContent {
        role: None,
        parts: vec![WirePart { text: Some(text.clone()), ..Default::default() }],
    });

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        let function_declarations = request.tools.values().map(sanitize_declaration).collect();
        vec![WireTool { function_declarations }]
    };

    let config = request.config.clone().unwrap_or_default();
    let generation_config = GenerationConfig {
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        max_output_tokens: effective_config(request.config.as_ref(), default_max_tokens),
    };
    let generation_config =
        (generation_config != GenerationConfig::default()).then_some(generation_config);

    GenerateContentRequest { contents, system_instruction, tools, generation_config }
}

fn content_to_wire(content: &Content) -> WireContent {
    // Gemini only knows `user` and `model`; tool results travel as user turns.
    let role = match content.role.as_str() {
        "model" => "model",
        _ => "user",
    };
    let parts = content
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => WirePart { text: Some(text.clone()), ..Default::default() },
            Part::FunctionCall { name, args, .. } => WirePart {
                function_call: Some(WireFunctionCall { name: name.clone(), args: args.clone() }),
                ..Default::default()
            },
            Part::FunctionResponse { function_response, .. } => WirePart {
                function_response: Some(WireFunctionResponse {
                    name: function_response.name.clone(),
                    response: as_object(function_response.response.clone()),
                }),
                ..Default::default()
            },
        })
        .collect();
    WireContent { role: Some(role.to_string()), parts }
}

/// Gemini rejects non-object function responses.
fn as_object(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        other => serde_json::json!({ "result": other }),
    }
}

fn sanitize_declaration(declaration: &Value) -> Value {
    let mut declaration = declaration.clone();
    if let Some(params) = declaration.get_mut("parameters") {
        *params = sanitize_schema(params);
    }
    declaration
}

/// Reduce a JSON schema to the OpenAPI subset Gemini accepts
///
/// `["string", "null"]` style types, as emitted for `Option<T>` fields,
/// collapse to the non-null type with `nullable: true`.
pub fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(map) = schema else { return schema.clone() };
    let mut out = Map::new();

    for (key, value) in map {
        match key.as_str() {
            "type" => match value {
                Value::Array(types) => {
                    let non_null: Vec<&Value> =
                        types.iter().filter(|t| t.as_str() != Some("null")).collect();
                    if let Some(first) = non_null.first() {
                        out.insert("type".to_string(), (*first).clone());
                    }
                    if non_null.len() < types.len() {
                        out.insert("nullable".to_string(), Value::Bool(true));
                    }
                }
                other => {
                    out.insert("type".to_string(), other.clone());
                }
            },
            "properties" => {
                if let Value::Object(props) = value {
                    let props =
                        props.iter().map(|(k, v)| (k.clone(), sanitize_schema(v))).collect();
                    out.insert("properties".to_string(), Value::Object(props));
                }
            }
            "items" => {
                out.insert("items".to_string(), sanitize_schema(value));
            }
            "description" | "required" | "enum" | "nullable" | "format" => {
                out.insert(key.clone(), value.clone());
            }
            _ => {}
        }
    }
    Value::Object(out)
}

pub fn from_response(response: &GenerateContentResponse) -> LlmResponse {
    let candidate = response.candidates.first();

    let content = candidate.and_then(|c| c.content.as_ref()).map(|content| Content {
        role: "model".to_string(),
        parts: content.parts.iter().filter_map(part_from_wire).collect(),
    });

    let finish_reason =
        candidate.and_then(|c| c.finish_reason.as_deref()).map(|reason| match reason {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            _ => FinishReason::Other,
        });

    let usage_metadata = response.usage_metadata.as_ref().map(|u| UsageMetadata {
        prompt_token_count: u.prompt_token_count,
        candidates_token_count: u.candidates_token_count,
        total_token_count: u.total_token_count,
    });

    LlmResponse { content, usage_metadata, finish_reason, partial: false, turn_complete: true }
}

fn part_from_wire(part: &WirePart) -> Option<Part> {
    if part.thought == Some(true) {
        return None;
    }
    if let Some(call) = &part.function_call {
        return Some(Part::function_call(call.name.clone(), call.args.clone()));
    }
    if let Some(response) = &part.function_response {
        return Some(Part::function_response(response.name.clone(), response.response.clone()));
    }
    part.text.as_ref().map(|text| Part::text_part(text.clone()))
}

/// Merge a request-level config over a model default cap.
pub fn effective_config(
    config: Option<&GenerateContentConfig>,
    default_max_tokens: Option<i32>,
) -> Option<i32> {
    config.and_then(|c| c.max_output_tokens).or(default_max_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_maps_roles_and_tools() {
        let mut request = LlmRequest::new(
            "gemini-2.5-flash-lite",
            vec![
                Content::new("user").with_text("Book a flight from SFO to BOM"),
                Content::new("model")
                    .with_part(Part::function_call("book_flight", json!({"from_airport": "SFO"}))),
                Content::new("function")
                    .with_part(Part::function_response("book_flight", json!("done"))),
            ],
        )
        .with_system_instruction("You only handle flight booking.");
        request.tools.insert(
            "book_flight".to_string(),
            json!({
                "name": "book_flight",
                "description": "Books a flight",
                "parameters": {
                    "$schema": "http://json-schema.org/draft-07/schema#",
                    "title": "FlightBookingArgs",
                    "type": "object",
                    "properties": {"date": {"type": ["string", "null"]}},
                    "required": []
                }
            }),
        );

        let wire = serde_json::to_value(to_request(&request, Some(1000))).unwrap();

        assert_eq!(wire["contents"][2]["role"], "user");
        let response = &wire["contents"][2]["parts"][0]["functionResponse"]["response"];
        assert_eq!(response["result"], "done");
        assert_eq!(wire["contents"][1]["parts"][0]["functionCall"]["name"], "book_flight");
        assert_eq!(
            wire["systemInstruction"]["parts"][0]["text"],
            "You only handle flight booking."
        );
        assert_eq!(wire["generationConfig"]["maxOutputTokens"], 1000);

        let params = &wire["tools"][0]["functionDeclarations"][0]["parameters"];
        assert!(params.get("$schema").is_none());
        assert!(params.get("title").is_none());
        assert_eq!(params["properties"]["date"]["type"], "string");
        assert_eq!(params["properties"]["date"]["nullable"], true);
    }

    #[test]
    fn test_request_without_config_omits_generation_config() {
        let request = LlmRequest::new("m", vec![Content::new("user").with_text("hi")]);
        let wire = serde_json::to_value(to_request(&request, None)).unwrap();
        assert!(wire.get("generationConfig").is_none());
        assert!(wire.get("tools").is_none());
    }

    #[test]
    fn test_response_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "planning", "thought": true},
                    {"functionCall": {"name": "book_hotel", "args": {"city": "Mumbai"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        }))
        .unwrap();

        let llm = from_response(&response);
        let content = llm.content.unwrap();
        assert_eq!(content.parts.len(), 1);
        assert_eq!(content.function_calls()[0].0, "book_hotel");
        assert_eq!(llm.finish_reason, Some(FinishReason::Stop));
        assert_eq!(llm.usage_metadata.unwrap().total_token_count, 15);
    }

    #[test]
    fn test_effective_config_prefers_request() {
        let config = GenerateContentConfig { max_output_tokens: Some(100), ..Default::default() };
        assert_eq!(effective_config(Some(&config), Some(1000)), Some(100));
        assert_eq!(effective_config(None, Some(1000)), Some(1000));
    }
}

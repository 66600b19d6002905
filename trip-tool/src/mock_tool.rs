use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::{Arc, LazyLock, Mutex};
use trip_core::{Result, Tool, ToolContext};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Stand-in for a real tool that answers with a canned response
///
/// `{{name}}` placeholders inside string values of the response are filled
/// from the call's arguments. Placeholders without a matching argument are
/// left as written.
pub struct MockTool {
    name: String,
    description: String,
    parameters_schema: Option<Value>,
    response: Value,
    calls: Mutex<Vec<Value>>,
}

impl MockTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, response: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: None,
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mock with the same declaration as `tool`, so the model sees no difference.
    pub fn replacing(tool: &dyn Tool, response: Value) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters_schema: tool.parameters_schema(),
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_parameters_schema(mut self, schema: Value) -> Self {
        self.parameters_schema = Some(schema);
        self
    }

    /// Arguments of every call so far.
    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

fn arg_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fill `{{name}}` placeholders in every string of `template` from `args`.
pub fn render_template(template: &Value, args: &Value) -> Value {
    match template {
        Value::String(text) => {
            let rendered = PLACEHOLDER.replace_all(text, |caps: &Captures| {
                args.get(&caps[1]).map(arg_text).unwrap_or_else(|| caps[0].to_string())
            });
            Value::String(rendered.into_owned())
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| render_template(v, args)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), render_template(v, args))).collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        self.parameters_schema.clone()
    }

    async fn execute(&self, _ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value> {
        tracing::debug!(tool = %self.name, "Answering with mocked response");
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).push(args.clone());
        Ok(render_template(&self.response, &args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_fills_known_placeholders() {
        let template = json!("Flight booked from {{from_airport}} to {{ to_airport }}.");
        let args = json!({"from_airport": "SFO", "to_airport": "BOM"});
        assert_eq!(render_template(&template, &args), json!("Flight booked from SFO to BOM."));
    }

    #[test]
    fn test_render_keeps_unknown_placeholders_and_nests() {
        let template = json!({"status": "success", "message": "Stay of {{duration}} nights at {{hotel_name}}"});
        let args = json!({"duration": 4});
        assert_eq!(
            render_template(&template, &args),
            json!({"status": "success", "message": "Stay of 4 nights at {{hotel_name}}"})
        );
    }
}

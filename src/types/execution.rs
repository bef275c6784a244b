use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Arguments = serde_json::Map<String, Value>;

/// Raw backend payload before normalization.
#[derive(Debug, Clone, Copy)]
pub enum RawPayload<'a> {
    Text(&'a str),
    Json(&'a Value),
}

impl<'a> From<&'a str> for RawPayload<'a> {
    fn from(text: &'a str) -> Self {
        RawPayload::Text(text)
    }
}

impl<'a> From<&'a String> for RawPayload<'a> {
    fn from(text: &'a String) -> Self {
        RawPayload::Text(text.as_str())
    }
}

impl<'a> From<&'a Value> for RawPayload<'a> {
    fn from(value: &'a Value) -> Self {
        RawPayload::Json(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self {
            success: true,
            output: None,
            error: None,
        }
    }
}

/// Canonical record produced by `payload::normalize`.
///
/// Serializes to the flat `{ tool_name?, arguments, result }` shape, which the
/// normalizer accepts back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedExecution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default)]
    pub result: ExecutionResult,
}

pub const PARSE_FAILURE: &str = "parse failure";

impl NormalizedExecution {
    pub fn parse_failure() -> Self {
        Self {
            tool_name: None,
            arguments: Arguments::new(),
            result: ExecutionResult {
                success: false,
                output: None,
                error: Some(PARSE_FAILURE.to_string()),
            },
        }
    }

    pub fn is_parse_failure(&self) -> bool {
        !self.result.success && self.result.error.as_deref() == Some(PARSE_FAILURE)
    }
}

/// One classified tool invocation. Immutable once built; a refined stream
/// produces a new value rather than patching an old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub kind: String,
    pub arguments: Arguments,
    pub is_success: bool,
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl ToolCall {
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.arguments.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.arguments.get(field).and_then(Value::as_str)
    }

    /// Resolved `attachments` list; empty when the tool carried none.
    pub fn attachments(&self) -> Vec<String> {
        self.arguments
            .get("attachments")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn output_text(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            Value::Object(map) => map
                .get("output")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| serde_json::to_string_pretty(map).ok()),
            other => Some(other.to_string()),
        }
    }

    pub fn edit_preview(&self) -> crate::edit_diff::EditPreview {
        crate::edit_diff::edit_preview(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_execution_result_defaults_to_success() {
        let parsed: ExecutionResult = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.output, None);
        assert_eq!(parsed.error, None);
    }

    #[test]
    fn test_parse_failure_record() {
        let failure = NormalizedExecution::parse_failure();
        assert!(failure.is_parse_failure());
        assert!(failure.arguments.is_empty());
        assert!(!NormalizedExecution::default().is_parse_failure());
    }

    #[test]
    fn test_tool_call_accessors() {
        let call = ToolCall {
            kind: "ask".to_string(),
            arguments: json!({ "text": "hi", "attachments": ["a.png", 3, "b.png"] })
                .as_object()
                .cloned()
                .unwrap(),
            is_success: true,
            error_message: None,
            output: Some(json!({ "output": "done" })),
        };
        assert_eq!(call.text("text"), Some("hi"));
        assert_eq!(call.attachments(), vec!["a.png", "b.png"]);
        assert_eq!(call.output_text().as_deref(), Some("done"));
    }
}

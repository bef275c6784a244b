use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    User,
    Assistant,
    Tool,
    #[serde(other)]
    Other,
}

/// Message bodies arrive either as text or as already-decoded JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Json(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    #[serde(default)]
    pub message_id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl AgentMessage {
    /// Metadata object, decoding it first when the backend stored it as a JSON string.
    pub fn metadata_object(&self) -> Option<serde_json::Map<String, Value>> {
        match self.metadata.as_ref()? {
            Value::Object(map) => Some(map.clone()),
            Value::String(text) => serde_json::from_str::<Value>(text)
                .ok()
                .and_then(|value| value.as_object().cloned()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_message_accepts_text_and_object_content() {
        let text: AgentMessage = serde_json::from_value(json!({
            "message_id": "m1",
            "type": "assistant",
            "content": "hello"
        }))
        .unwrap();
        assert_eq!(text.message_type, MessageType::Assistant);
        assert_eq!(text.content, MessageContent::Text("hello".to_string()));

        let object: AgentMessage = serde_json::from_value(json!({
            "message_id": "m2",
            "type": "tool",
            "content": { "tool_execution": {} },
            "metadata": "{\"tool_name\":\"ask\"}"
        }))
        .unwrap();
        assert!(matches!(object.content, MessageContent::Json(_)));
        assert_eq!(
            object
                .metadata_object()
                .and_then(|m| m.get("tool_name").cloned()),
            Some(json!("ask"))
        );
    }

    #[test]
    fn test_unknown_message_type_is_tolerated() {
        let status: AgentMessage =
            serde_json::from_value(json!({ "type": "status", "content": "" })).unwrap();
        assert_eq!(status.message_type, MessageType::Other);
    }
}

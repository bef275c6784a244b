use crate::extract::extract;
use crate::payload::{try_normalize, Normalization};
use crate::stream::markup::find_tag_end;
use crate::stream::Segmenter;
use crate::types::{
    AgentMessage, Arguments, ExecutionResult, MessageContent, MessageType, NormalizedExecution,
    RawPayload, ToolCall,
};
use crate::util::looks_like_json;
use serde_json::Value;

const TOOL_RESULT_OPEN: &str = "<tool_result>";
const UNKNOWN_TOOL_KIND: &str = "unknown";

/// Tool calls carried by one transcript message.
///
/// Assistant messages are segmented as finished text; tool messages carry a
/// single execution payload; user messages never carry tool calls.
pub fn extract_tool_calls(message: &AgentMessage, segmenter: &Segmenter) -> Vec<ToolCall> {
    match message.message_type {
        MessageType::Assistant => {
            let text = assistant_text(&message.content);
            segmenter.finish(&text).into_tool_calls()
        }
        MessageType::Tool => extract_tool_result(message).into_iter().collect(),
        MessageType::User | MessageType::Other => Vec::new(),
    }
}

/// The execution recorded by a `tool` message, when one can be found.
pub fn extract_tool_result(message: &AgentMessage) -> Option<ToolCall> {
    let metadata = message.metadata_object().unwrap_or_default();
    let call_args = metadata.get("arguments").and_then(Value::as_object);

    let outcome = match &message.content {
        MessageContent::Text(text) => try_normalize(RawPayload::Text(text)),
        MessageContent::Json(value) => try_normalize(RawPayload::Json(value)),
    };

    let (wrapped_kind, normalized) = match outcome {
        Normalization::Parsed(execution) => (None, execution),
        Normalization::Failed(err) => match content_text(&message.content)
            .as_deref()
            .and_then(parse_tool_result_markup)
        {
            Some((kind, execution)) => (Some(kind), execution),
            None => {
                tracing::debug!(message_id = %message.message_id, error = %err, "tool message payload not recognized");
                (None, NormalizedExecution::parse_failure())
            }
        },
    };

    let kind = metadata
        .get("tool_name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| normalized.tool_name.clone())
        .or(wrapped_kind);

    match kind {
        Some(kind) => Some(extract(&kind, call_args, &normalized)),
        None if normalized.is_parse_failure() => None,
        None => Some(extract(UNKNOWN_TOOL_KIND, call_args, &normalized)),
    }
}

/// Assistant text, unwrapping one `{"role":..,"content":".."}` encoding level.
fn assistant_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) if looks_like_json(text) => {
            serde_json::from_str::<Value>(text.trim())
                .ok()
                .and_then(|value| value.get("content")?.as_str().map(str::to_string))
                .unwrap_or_else(|| text.clone())
        }
        MessageContent::Text(text) => text.clone(),
        MessageContent::Json(value) => value
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
    }
}

fn content_text(content: &MessageContent) -> Option<String> {
    match content {
        MessageContent::Text(text) => Some(text.clone()),
        MessageContent::Json(value) => value
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// `<tool_result><kind>body</kind></tool_result>`, the older result wrapper.
/// A JSON body is normalized; anything else becomes the raw output.
fn parse_tool_result_markup(text: &str) -> Option<(String, NormalizedExecution)> {
    let wrapper_start = text.find(TOOL_RESULT_OPEN)?;
    let inner = &text[wrapper_start + TOOL_RESULT_OPEN.len()..];
    let tag_start = inner.find('<')?;
    let header = &inner[tag_start + 1..];
    let header_end = find_tag_end(header)?;
    let name = header[..header_end]
        .split_whitespace()
        .next()
        .filter(|name| !name.is_empty() && !name.starts_with('/'))?
        .to_string();

    let body_start = header_end + 1;
    let close_tag = format!("</{name}>");
    let body = match header[body_start..].find(&close_tag) {
        Some(rel) => &header[body_start..body_start + rel],
        None => &header[body_start..],
    };

    let execution = match try_normalize(RawPayload::Text(body)) {
        Normalization::Parsed(execution) => execution,
        Normalization::Failed(_) => NormalizedExecution {
            tool_name: None,
            arguments: Arguments::new(),
            result: ExecutionResult {
                output: Some(Value::String(body.trim().to_string())),
                ..ExecutionResult::default()
            },
        },
    };
    Some((crate::extract::normalize_kind(&name), execution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::SegmenterConfig;
    use serde_json::json;

    fn segmenter() -> Segmenter {
        Segmenter::new(&SegmenterConfig::default()).expect("segmenter")
    }

    fn message(message_type: &str, content: Value, metadata: Option<Value>) -> AgentMessage {
        serde_json::from_value(json!({
            "message_id": "m1",
            "type": message_type,
            "content": content,
            "metadata": metadata,
        }))
        .expect("message")
    }

    #[test]
    fn test_user_messages_have_no_tool_calls() {
        let user = message("user", json!("<ask>hi</ask>"), None);
        assert!(extract_tool_calls(&user, &segmenter()).is_empty());
    }

    #[test]
    fn test_assistant_message_is_segmented_as_finished() {
        let assistant = message(
            "assistant",
            json!("Searching.<function_calls><invoke name=\"web_search\"><parameter name=\"query\">tokio</parameter></invoke></function_calls>"),
            None,
        );
        let calls = extract_tool_calls(&assistant, &segmenter());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text("query"), Some("tokio"));
    }

    #[test]
    fn test_assistant_content_encoded_as_json_string() {
        let encoded = json!({
            "role": "assistant",
            "content": "Hi <function_calls><invoke name=\"web_search\"><parameter name=\"query\">rust</parameter></invoke></function_calls>"
        })
        .to_string();
        let assistant = message("assistant", Value::String(encoded), None);
        let calls = extract_tool_calls(&assistant, &segmenter());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, "web-search");
        assert_eq!(calls[0].text("query"), Some("rust"));
    }

    #[test]
    fn test_tool_message_with_execution_payload() {
        let content = json!({
            "role": "tool",
            "content": json!({
                "tool_execution": {
                    "function_name": "str_replace",
                    "arguments": { "file_path": "a.rs", "old_str": "x", "new_str": "y" },
                    "result": { "success": true, "output": "{\"file_path\":\"src/a.rs\"}" }
                }
            }).to_string()
        })
        .to_string();
        let tool = message("tool", Value::String(content), None);
        let call = extract_tool_result(&tool).expect("tool call");
        assert_eq!(call.kind, "str-replace");
        assert_eq!(call.text("file_path"), Some("src/a.rs"));
        assert!(call.is_success);
    }

    #[test]
    fn test_metadata_overrides_kind_and_supplies_call_args() {
        let tool = message(
            "tool",
            json!({ "result": { "output": "sent" } }),
            Some(json!({ "tool_name": "ask", "arguments": { "text": "question?" } })),
        );
        let call = extract_tool_result(&tool).expect("tool call");
        assert_eq!(call.kind, "ask");
        assert_eq!(call.text("text"), Some("question?"));
    }

    #[test]
    fn test_legacy_tool_result_wrapper() {
        let tool = message(
            "tool",
            json!("<tool_result> <execute-command> total 0 </execute-command> </tool_result>"),
            None,
        );
        let call = extract_tool_result(&tool).expect("tool call");
        assert_eq!(call.kind, "execute-command");
        assert_eq!(call.output, Some(json!("total 0")));
    }

    #[test]
    fn test_unreadable_tool_message_yields_nothing() {
        let tool = message("tool", json!("plain words"), None);
        assert_eq!(extract_tool_result(&tool), None);
    }
}

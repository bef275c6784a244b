use super::ToolCall;
use serde::{Deserialize, Serialize};

/// Live view of one in-flight assistant message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    pub clean_text: String,
    pub open_tool_name: Option<String>,
    pub is_open_tool_streaming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    /// Nothing buffered yet.
    Idle,
    ScanningText,
    /// A marker has started but no tool name can be trusted yet.
    AwaitingToolName,
    /// Name known, opening tag still streaming.
    ToolNameRecognized,
    ToolBodyStreaming,
    /// Buffer ends exactly at a closing marker.
    ToolComplete,
}

impl StreamPhase {
    pub fn is_tool_open(self) -> bool {
        matches!(
            self,
            StreamPhase::ToolNameRecognized | StreamPhase::ToolBodyStreaming
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { content: String },
    Tool { call: ToolCall },
}

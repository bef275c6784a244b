mod execution;
mod message;
mod stream;

pub use execution::{Arguments, ExecutionResult, NormalizedExecution, RawPayload, ToolCall};
pub use message::{AgentMessage, MessageContent, MessageType};
pub use stream::{Segment, StreamPhase, StreamState};

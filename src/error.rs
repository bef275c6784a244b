use std::fmt;

/// Which decode step rejected a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStage {
    Payload,
    DoubleEncoded,
    ToolExecution,
    Content,
}

impl fmt::Display for JsonStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JsonStage::Payload => "payload",
            JsonStage::DoubleEncoded => "double-encoded payload",
            JsonStage::ToolExecution => "tool_execution",
            JsonStage::Content => "content",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid JSON in {stage}: {message}")]
    InvalidJson { stage: JsonStage, message: String },
    #[error("unrecognized payload shape: {found}")]
    UnrecognizedShape { found: &'static str },
    #[error("payload nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

impl NormalizeError {
    pub(crate) fn invalid_json(stage: JsonStage, err: serde_json::Error) -> Self {
        NormalizeError::InvalidJson {
            stage,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("minimum tool name length must be between 1 and {max}, got {value}")]
    ToolNameThreshold { value: usize, max: usize },
    #[error("invalid tool tag '{0}': expected a kebab-case identifier")]
    InvalidToolTag(String),
    #[error("failed to build marker matcher: {0}")]
    MarkerMatcher(#[from] aho_corasick::BuildError),
}

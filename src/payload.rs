use crate::error::{JsonStage, NormalizeError};
use crate::logging::emit_payload_parse_failure;
use crate::types::{Arguments, ExecutionResult, NormalizedExecution, RawPayload};
use crate::util::looks_like_json;
use serde_json::{Map, Value};

pub const MAX_NESTING_DEPTH: usize = 4;

const TOOL_NAME_KEYS: [&str; 4] = ["function_name", "xml_tag_name", "tool_name", "name"];
const ARGUMENT_KEYS: [&str; 3] = ["arguments", "parameters", "input"];
const FLAT_MARKER_KEYS: [&str; 7] = [
    "arguments",
    "parameters",
    "result",
    "output",
    "success",
    "function_name",
    "xml_tag_name",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Normalization {
    Parsed(NormalizedExecution),
    Failed(NormalizeError),
}

impl Normalization {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Normalization::Parsed(_))
    }

    /// Collapse into the total record; failures become the parse-failure shape.
    pub fn into_execution(self) -> NormalizedExecution {
        match self {
            Normalization::Parsed(execution) => execution,
            Normalization::Failed(_) => NormalizedExecution::parse_failure(),
        }
    }
}

pub fn normalize<'a>(raw: impl Into<RawPayload<'a>>) -> NormalizedExecution {
    let raw = raw.into();
    let outcome = try_normalize(raw);
    if let Normalization::Failed(err) = &outcome {
        emit_payload_parse_failure(raw, err);
    }
    outcome.into_execution()
}

pub fn try_normalize(raw: RawPayload<'_>) -> Normalization {
    match raw {
        RawPayload::Text(text) => match decode_payload_text(text) {
            Ok(value) => normalize_value(&value, 0),
            Err(err) => Normalization::Failed(err),
        },
        RawPayload::Json(value) => match value {
            Value::String(text) => match decode_payload_text(text) {
                Ok(decoded) => normalize_value(&decoded, 0),
                Err(err) => Normalization::Failed(err),
            },
            other => normalize_value(other, 0),
        },
    }
}

/// One JSON parse, plus a second when the first yields a JSON-looking string.
fn decode_payload_text(text: &str) -> Result<Value, NormalizeError> {
    let first: Value = serde_json::from_str(text.trim())
        .map_err(|err| NormalizeError::invalid_json(JsonStage::Payload, err))?;
    match first {
        Value::String(inner) if looks_like_json(&inner) => serde_json::from_str(inner.trim())
            .map_err(|err| NormalizeError::invalid_json(JsonStage::DoubleEncoded, err)),
        other => Ok(other),
    }
}

type ShapeMatcher = fn(&Map<String, Value>, usize) -> Option<Normalization>;

const SHAPE_MATCHERS: [(&str, ShapeMatcher); 3] = [
    ("tool_execution", match_tool_execution),
    ("nested_content", match_nested_content),
    ("flat_execution", match_flat_execution),
];

fn normalize_value(value: &Value, depth: usize) -> Normalization {
    if depth > MAX_NESTING_DEPTH {
        return Normalization::Failed(NormalizeError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }

    let Some(object) = value.as_object() else {
        return Normalization::Failed(NormalizeError::UnrecognizedShape {
            found: json_kind(value),
        });
    };

    for (shape, matcher) in SHAPE_MATCHERS {
        if let Some(outcome) = matcher(object, depth) {
            tracing::trace!(shape, parsed = outcome.is_parsed(), "payload shape matched");
            return outcome;
        }
    }

    Normalization::Failed(NormalizeError::UnrecognizedShape { found: "object" })
}

fn match_tool_execution(object: &Map<String, Value>, _depth: usize) -> Option<Normalization> {
    let execution = object.get("tool_execution")?;
    let outcome = match execution {
        Value::Object(inner) => Normalization::Parsed(execution_from_object(inner)),
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(inner)) => Normalization::Parsed(execution_from_object(&inner)),
            Ok(other) => Normalization::Failed(NormalizeError::UnrecognizedShape {
                found: json_kind(&other),
            }),
            Err(err) => {
                Normalization::Failed(NormalizeError::invalid_json(JsonStage::ToolExecution, err))
            }
        },
        other => Normalization::Failed(NormalizeError::UnrecognizedShape {
            found: json_kind(other),
        }),
    };
    Some(outcome)
}

/// `content` only claims the object when it holds an execution; otherwise the
/// next matcher gets a turn.
fn match_nested_content(object: &Map<String, Value>, depth: usize) -> Option<Normalization> {
    let outcome = match object.get("content")? {
        inner @ Value::Object(_) => normalize_value(inner, depth + 1),
        Value::String(text) if looks_like_json(text) => {
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(inner) => normalize_value(&inner, depth + 1),
                Err(err) => {
                    Normalization::Failed(NormalizeError::invalid_json(JsonStage::Content, err))
                }
            }
        }
        _ => return None,
    };
    match outcome {
        Normalization::Failed(err) if has_flat_markers(object) => {
            tracing::trace!(error = %err, "nested content is not an execution");
            None
        }
        outcome => Some(outcome),
    }
}

fn has_flat_markers(object: &Map<String, Value>) -> bool {
    FLAT_MARKER_KEYS.iter().any(|key| object.contains_key(*key))
}

fn match_flat_execution(object: &Map<String, Value>, _depth: usize) -> Option<Normalization> {
    has_flat_markers(object).then(|| Normalization::Parsed(execution_from_object(object)))
}

fn execution_from_object(object: &Map<String, Value>) -> NormalizedExecution {
    let tool_name = TOOL_NAME_KEYS.iter().find_map(|key| {
        object
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    });

    let arguments = ARGUMENT_KEYS
        .iter()
        .find_map(|key| object.get(*key).map(arguments_from_value))
        .unwrap_or_default();

    let result = match object.get("result") {
        Some(Value::Object(result)) => result_from_object(result),
        Some(Value::Null) | None => result_from_object(object),
        Some(other) => ExecutionResult {
            output: decode_output(other),
            ..ExecutionResult::default()
        },
    };

    NormalizedExecution {
        tool_name,
        arguments,
        result,
    }
}

fn arguments_from_value(value: &Value) -> Arguments {
    match value {
        Value::Object(map) => map.clone(),
        Value::String(text) if looks_like_json(text) => {
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(Value::Object(map)) => map,
                _ => Arguments::new(),
            }
        }
        _ => Arguments::new(),
    }
}

fn result_from_object(result: &Map<String, Value>) -> ExecutionResult {
    let success = match result.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => crate::util::parse_bool_str(flag).unwrap_or(true),
        _ => true,
    };
    let error = match result.get("error") {
        Some(Value::String(message)) if !message.trim().is_empty() => Some(message.clone()),
        Some(Value::Object(detail)) => Some(
            detail
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(detail.clone()).to_string()),
        ),
        _ => None,
    };

    ExecutionResult {
        success,
        output: result.get("output").and_then(decode_output),
        error,
    }
}

/// JSON-looking output strings are decoded when they parse; otherwise kept raw.
fn decode_output(output: &Value) -> Option<Value> {
    match output {
        Value::Null => None,
        Value::String(text) if looks_like_json(text) => Some(
            serde_json::from_str::<Value>(text.trim()).unwrap_or_else(|_| output.clone()),
        ),
        other => Some(other.clone()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

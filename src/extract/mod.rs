mod schema;

pub use schema::{known_kinds, schema_for, FieldKind, FieldSpec, ToolSchema, TOOL_SCHEMAS};

use crate::types::{Arguments, NormalizedExecution, ToolCall};
use crate::util::looks_like_json;
use serde_json::Value;

/// Canonical kind for a backend tool name: `str_replace` and `Str-Replace`
/// both become `str-replace`.
pub fn normalize_kind(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_ascii_lowercase()
        .replace('_', "-")
}

/// Build a `ToolCall` from call-site arguments and a normalized execution.
///
/// Sources are layered call-site args, then `normalized.arguments`, then the
/// object form of `result.output`; for each field the last source that has a
/// non-empty alias wins. Kinds without a schema keep the merged raw arguments.
pub fn extract(
    kind: &str,
    call_args: Option<&Arguments>,
    normalized: &NormalizedExecution,
) -> ToolCall {
    let kind = normalize_kind(kind);
    let output_args = normalized.result.output.as_ref().and_then(Value::as_object);
    let sources = [call_args, Some(&normalized.arguments), output_args];

    let arguments = match schema_for(&kind) {
        Some(schema) => resolve_schema(schema, &sources),
        None => merge_raw(&sources[..2], output_args),
    };

    let error_message = normalized
        .result
        .error
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string);
    let is_success = normalized.result.success && error_message.is_none();

    ToolCall {
        kind,
        arguments,
        is_success,
        error_message,
        output: normalized.result.output.clone(),
    }
}

fn resolve_schema(schema: &ToolSchema, sources: &[Option<&Arguments>]) -> Arguments {
    let mut resolved = Arguments::new();
    for field in schema.fields {
        if let Some(value) = resolve_field(field, sources) {
            resolved.insert(field.name.to_string(), value);
        }
    }
    resolved
}

pub fn resolve_field(field: &FieldSpec, sources: &[Option<&Arguments>]) -> Option<Value> {
    sources
        .iter()
        .flatten()
        .filter_map(|source| first_field_value(source, field))
        .last()
}

/// First alias in declared order that carries a non-empty value.
pub fn first_field_value(source: &Arguments, field: &FieldSpec) -> Option<Value> {
    field
        .aliases
        .iter()
        .find_map(|alias| source.get(*alias).and_then(|v| coerce_field(field.kind, v)))
}

fn coerce_field(kind: FieldKind, value: &Value) -> Option<Value> {
    match kind {
        FieldKind::Text => match value {
            Value::String(text) if !text.is_empty() => Some(value.clone()),
            Value::Number(number) => Some(Value::String(number.to_string())),
            Value::Bool(flag) => Some(Value::String(flag.to_string())),
            _ => None,
        },
        FieldKind::Attachments => {
            let items = parse_attachments(value);
            (!items.is_empty()).then(|| Value::from(items))
        }
        FieldKind::Value => match value {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) if looks_like_json(text) => Some(
                serde_json::from_str::<Value>(text.trim()).unwrap_or_else(|_| value.clone()),
            ),
            other => Some(other.clone()),
        },
    }
}

/// Attachment lists arrive as arrays or as one comma-separated string.
pub fn parse_attachments(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(text) if text.trim_start().starts_with('[') => {
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(items @ Value::Array(_)) => parse_attachments(&items),
                _ => split_attachment_list(text),
            }
        }
        Value::String(text) => split_attachment_list(text),
        _ => Vec::new(),
    }
}

fn split_attachment_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Later sources win. Output only corrects keys the call already carries.
fn merge_raw(sources: &[Option<&Arguments>], output: Option<&Arguments>) -> Arguments {
    let mut merged = Arguments::new();
    for source in sources.iter().flatten() {
        for (key, value) in source.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in output.into_iter().flatten() {
        if let Some(slot) = merged.get_mut(key) {
            *slot = value.clone();
        }
    }
    merged
}

use crate::types::Arguments;
use serde_json::Value;

pub(crate) const FUNCTION_CALLS_OPEN: &str = "<function_calls>";
pub(crate) const FUNCTION_CALLS_CLOSE: &str = "</function_calls>";
pub(crate) const INVOKE_OPEN: &str = "<invoke";
pub(crate) const INVOKE_CLOSE: &str = "</invoke>";
pub(crate) const FUNCTION_OPEN: &str = "<function=";
pub(crate) const FUNCTION_CLOSE: &str = "</function>";
const PARAMETER_OPEN: &str = "<parameter";
const PARAMETER_CLOSE: &str = "</parameter>";

const BODY_MARKERS: [&str; 6] = [
    PARAMETER_OPEN,
    PARAMETER_CLOSE,
    INVOKE_CLOSE,
    FUNCTION_CLOSE,
    FUNCTION_CALLS_CLOSE,
    FUNCTION_OPEN,
];

/// Streaming body with any trailing fragment of a marker cut off, so a
/// half-arrived `</parameter>` never shows up inside a value.
pub(crate) fn settled_body<'a>(body: &'a str, extra_markers: &[&str]) -> &'a str {
    let Some(start) = body.rfind('<') else {
        return body;
    };
    let fragment = &body[start..];
    let partial = BODY_MARKERS
        .iter()
        .chain(extra_markers)
        .any(|marker| marker.len() > fragment.len() && marker.starts_with(fragment));
    if partial {
        &body[..start]
    } else {
        body
    }
}

/// Body of a `<function=...>` call ends at `</function>` or at the next
/// `<function=` opener. `None` while neither has arrived.
pub(crate) fn find_function_body_bounds(text: &str, body_start: usize) -> Option<(usize, usize)> {
    let function_close = text[body_start..]
        .find(FUNCTION_CLOSE)
        .map(|rel| body_start + rel);
    let next_function = text[body_start..]
        .find(FUNCTION_OPEN)
        .map(|rel| body_start + rel);

    match (function_close, next_function) {
        (Some(close), Some(next)) if next < close => Some((next, next)),
        (Some(close), _) => Some((close, close + FUNCTION_CLOSE.len())),
        (None, Some(next)) => Some((next, next)),
        (None, None) => None,
    }
}

/// Offset of the `>` closing a tag header, skipping quoted attribute values.
pub(crate) fn find_tag_end(header: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (index, ch) in header.char_indices() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(index),
            (None, _) => {}
        }
    }
    None
}

/// `key="value"` pairs from a tag header. An unterminated quote runs to the
/// end of the header, which is what a still-streaming header looks like.
pub(crate) fn parse_attributes(header: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut rest = header.trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c == '/' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = rest[key_end..].trim_start();

        if key.is_empty() {
            let skip = rest.chars().next().map(char::len_utf8).unwrap_or(0);
            rest = rest[skip..].trim_start();
            continue;
        }

        let Some(after_eq) = rest.strip_prefix('=') else {
            attributes.push((key.to_string(), String::new()));
            continue;
        };
        let after_eq = after_eq.trim_start();
        let (value, remaining) = match after_eq.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let quoted = &after_eq[1..];
                match quoted.find(quote) {
                    Some(end) => (&quoted[..end], &quoted[end + 1..]),
                    None => (quoted, ""),
                }
            }
            _ => {
                let end = after_eq
                    .find(char::is_whitespace)
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };
        attributes.push((key.to_string(), value.to_string()));
        rest = remaining.trim_start();
    }

    attributes
}

pub(crate) fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Parameters in either `<parameter=key>` or `<parameter name="key">` form.
pub(crate) fn parse_parameters(body: &str) -> Arguments {
    let mut input = Arguments::new();
    let mut parameter_cursor = 0usize;

    while let Some(parameter_rel) = body[parameter_cursor..].find(PARAMETER_OPEN) {
        let parameter_start = parameter_cursor + parameter_rel;
        let key_start = parameter_start + PARAMETER_OPEN.len();
        let Some(key_end_rel) = find_tag_end(&body[key_start..]) else {
            break;
        };
        let key_end = key_start + key_end_rel;
        let key = parameter_key(&body[key_start..key_end]);

        let value_start = key_end + 1;
        let parameter_close = body[value_start..]
            .find(PARAMETER_CLOSE)
            .map(|rel| value_start + rel);
        let next_parameter = body[value_start..]
            .find(PARAMETER_OPEN)
            .map(|rel| value_start + rel);

        let (value_end, next_cursor) = match (parameter_close, next_parameter) {
            (Some(close), Some(next)) if next < close => (next, next),
            (Some(close), _) => (close, close + PARAMETER_CLOSE.len()),
            (None, Some(next)) => (next, next),
            (None, None) => (body.len(), body.len()),
        };

        if let Some(key) = key.filter(|key| !key.is_empty()) {
            let value = normalize_tagged_parameter_value(&body[value_start..value_end]);
            input.insert(key, Value::String(value));
        }

        parameter_cursor = next_cursor.max(parameter_start + 1);
    }

    input
}

fn parameter_key(header: &str) -> Option<String> {
    if let Some(rest) = header.strip_prefix('=') {
        return Some(
            rest.trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string(),
        );
    }
    // `<parameters>` and friends are not parameter tags.
    if !header.starts_with(char::is_whitespace) {
        return None;
    }
    let attributes = parse_attributes(header);
    attribute(&attributes, "name").map(str::to_string)
}

pub(crate) fn normalize_tagged_parameter_value(raw: &str) -> String {
    let mut value = raw.replace("\r\n", "\n");
    if value.starts_with('\n') {
        value.remove(0);
    }
    if value.ends_with('\n') {
        value.pop();
    }
    value
}

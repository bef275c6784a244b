pub(crate) mod markup;

use crate::error::ConfigError;
use crate::extract::{self, known_kinds, normalize_kind, schema_for};
use crate::payload;
use crate::types::{Arguments, Segment, StreamPhase, StreamState, ToolCall};
use crate::util::is_kebab_identifier;
use aho_corasick::{AhoCorasick, MatchKind};
use markup::{
    attribute, find_function_body_bounds, find_tag_end, normalize_tagged_parameter_value,
    parse_attributes, parse_parameters, settled_body, FUNCTION_CALLS_CLOSE, FUNCTION_CALLS_OPEN,
    FUNCTION_OPEN, INVOKE_CLOSE, INVOKE_OPEN,
};
use serde::Serialize;
use serde_json::{json, Value};

pub const DEFAULT_MIN_TOOL_NAME_CHARS: usize = 3;
pub const MAX_MIN_TOOL_NAME_CHARS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Visible name characters required before an open tool is reported.
    pub min_tool_name_chars: usize,
    /// Kinds accepted as bare `<kind ...>` tags on top of the schema kinds.
    pub extra_tool_tags: Vec<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_tool_name_chars: DEFAULT_MIN_TOOL_NAME_CHARS,
            extra_tool_tags: Vec::new(),
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_tool_name_chars == 0 || self.min_tool_name_chars > MAX_MIN_TOOL_NAME_CHARS {
            return Err(ConfigError::ToolNameThreshold {
                value: self.min_tool_name_chars,
                max: MAX_MIN_TOOL_NAME_CHARS,
            });
        }
        if let Some(tag) = self
            .extra_tool_tags
            .iter()
            .find(|tag| !is_kebab_identifier(&normalize_kind(tag)))
        {
            return Err(ConfigError::InvalidToolTag(tag.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation {
    pub state: StreamState,
    pub phase: StreamPhase,
    pub segments: Vec<Segment>,
    /// Provisional call for the open tool, rebuilt from the parameters seen
    /// so far. Replaced on every scan until the tool closes.
    pub open_call: Option<ToolCall>,
}

impl Segmentation {
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Tool { call } => Some(call),
            Segment::Text { .. } => None,
        })
    }

    pub fn into_tool_calls(self) -> Vec<ToolCall> {
        self.segments
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Tool { call } => Some(call),
                Segment::Text { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Opener {
    FunctionCalls,
    Invoke,
    Function,
    Tag(String),
}

enum MarkerScan {
    Closed {
        calls: Vec<ToolCall>,
        end: usize,
    },
    Open {
        calls: Vec<ToolCall>,
        name: Option<String>,
        header_complete: bool,
        open_call: Option<ToolCall>,
    },
}

impl MarkerScan {
    fn open_unnamed(calls: Vec<ToolCall>) -> Self {
        MarkerScan::Open {
            calls,
            name: None,
            header_complete: false,
            open_call: None,
        }
    }
}

/// Stateless: every call rescans the whole buffer.
#[derive(Debug)]
pub struct Segmenter {
    matcher: AhoCorasick,
    openers: Vec<Opener>,
    patterns: Vec<String>,
    min_tool_name_chars: usize,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut openers = vec![Opener::FunctionCalls, Opener::Invoke, Opener::Function];
        let mut patterns = vec![
            FUNCTION_CALLS_OPEN.to_string(),
            INVOKE_OPEN.to_string(),
            FUNCTION_OPEN.to_string(),
        ];

        let mut tag_kinds: Vec<String> = known_kinds().map(str::to_string).collect();
        for extra in &config.extra_tool_tags {
            let kind = normalize_kind(extra);
            if !tag_kinds.contains(&kind) {
                tag_kinds.push(kind);
            }
        }
        for kind in tag_kinds {
            patterns.push(format!("<{kind}"));
            openers.push(Opener::Tag(kind));
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)?;

        Ok(Self {
            matcher,
            openers,
            patterns,
            min_tool_name_chars: config.min_tool_name_chars,
        })
    }

    /// Live view of a buffer that may still grow.
    pub fn segment(&self, buffer: &str) -> Segmentation {
        self.scan(buffer, false)
    }

    /// View of a finished message: unclosed tools are closed at the end of the
    /// buffer and held-back fragments are released as text.
    pub fn finish(&self, buffer: &str) -> Segmentation {
        self.scan(buffer, true)
    }

    fn scan(&self, buffer: &str, finished: bool) -> Segmentation {
        if buffer.is_empty() {
            return Segmentation {
                state: StreamState::default(),
                phase: StreamPhase::Idle,
                segments: Vec::new(),
                open_call: None,
            };
        }

        let mut builder = SegmentBuilder::default();
        let mut cursor = 0usize;
        let mut open: Option<(Option<String>, bool)> = None;
        let mut open_call: Option<ToolCall> = None;

        while cursor < buffer.len() {
            let Some(found) = self.matcher.find(&buffer[cursor..]) else {
                break;
            };
            let start = cursor + found.start();
            let opener_end = cursor + found.end();
            let opener = &self.openers[found.pattern().as_usize()];

            let Some(scan) = self.scan_marker(buffer, start, opener_end, opener, finished) else {
                builder.push_text(&buffer[cursor..start + 1]);
                cursor = start + 1;
                continue;
            };

            builder.push_text(&buffer[cursor..start]);
            match scan {
                MarkerScan::Closed { calls, end } => {
                    calls.into_iter().for_each(|call| builder.push_tool(call));
                    cursor = end;
                }
                MarkerScan::Open {
                    calls,
                    name,
                    header_complete,
                    open_call: partial,
                } => {
                    calls.into_iter().for_each(|call| builder.push_tool(call));
                    open = Some((name, header_complete));
                    open_call = partial;
                    cursor = buffer.len();
                }
            }
        }

        let mut held_back = false;
        if cursor < buffer.len() {
            let tail = &buffer[cursor..];
            match self.partial_marker_start(tail).filter(|_| !finished) {
                Some(fragment_start) => {
                    builder.push_text(&tail[..fragment_start]);
                    held_back = true;
                }
                None => builder.push_text(tail),
            }
        }

        let phase = match &open {
            Some((Some(_), false)) => StreamPhase::ToolNameRecognized,
            Some((Some(_), true)) => StreamPhase::ToolBodyStreaming,
            Some((None, _)) => StreamPhase::AwaitingToolName,
            None if held_back => StreamPhase::AwaitingToolName,
            None if builder.ends_with_tool() && !finished => StreamPhase::ToolComplete,
            None => StreamPhase::ScanningText,
        };
        let open_tool_name = open
            .and_then(|(name, _)| name)
            .filter(|_| phase.is_tool_open());

        if let Some(name) = &open_tool_name {
            tracing::trace!(tool = %name, ?phase, "open tool in stream");
        }

        let (clean_text, segments) = builder.finish();
        Segmentation {
            state: StreamState {
                clean_text,
                is_open_tool_streaming: phase.is_tool_open(),
                open_tool_name,
            },
            phase,
            segments,
            open_call: open_call.filter(|_| phase == StreamPhase::ToolBodyStreaming),
        }
    }

    fn scan_marker(
        &self,
        buffer: &str,
        start: usize,
        opener_end: usize,
        opener: &Opener,
        finished: bool,
    ) -> Option<MarkerScan> {
        match opener {
            Opener::FunctionCalls => Some(self.scan_function_calls(buffer, opener_end, finished)),
            Opener::Invoke => self
                .scan_invoke(buffer, start, buffer.len(), finished)
                .map(|scan| match scan {
                    InvokeScan::Closed { call, end } => MarkerScan::Closed {
                        calls: call.into_iter().collect(),
                        end,
                    },
                    InvokeScan::Open {
                        name,
                        header_complete,
                        open_call,
                    } => MarkerScan::Open {
                        calls: Vec::new(),
                        name,
                        header_complete,
                        open_call,
                    },
                }),
            Opener::Function => Some(self.scan_function(buffer, opener_end, finished)),
            Opener::Tag(kind) => self.scan_tag(buffer, opener_end, kind, finished),
        }
    }

    fn scan_function_calls(&self, buffer: &str, body_start: usize, finished: bool) -> MarkerScan {
        let close = buffer[body_start..]
            .find(FUNCTION_CALLS_CLOSE)
            .map(|rel| body_start + rel);
        let block_end = close.unwrap_or(buffer.len());
        let implicit_close = close.is_some() || finished;

        let mut calls = Vec::new();
        let mut cursor = body_start;
        while let Some(rel) = buffer[cursor..block_end].find(INVOKE_OPEN) {
            let invoke_start = cursor + rel;
            match self.scan_invoke(buffer, invoke_start, block_end, implicit_close) {
                Some(InvokeScan::Closed { call, end }) => {
                    calls.extend(call);
                    cursor = end.max(invoke_start + 1);
                }
                Some(InvokeScan::Open {
                    name,
                    header_complete,
                    open_call,
                }) => {
                    return MarkerScan::Open {
                        calls,
                        name,
                        header_complete,
                        open_call,
                    }
                }
                None => cursor = invoke_start + 1,
            }
        }

        match close {
            Some(close) => MarkerScan::Closed {
                calls,
                end: close + FUNCTION_CALLS_CLOSE.len(),
            },
            None if finished => MarkerScan::Closed {
                calls,
                end: buffer.len(),
            },
            None => MarkerScan::open_unnamed(calls),
        }
    }

    fn scan_invoke(
        &self,
        buffer: &str,
        start: usize,
        limit: usize,
        implicit_close: bool,
    ) -> Option<InvokeScan> {
        let header_start = start + INVOKE_OPEN.len();
        match buffer[header_start..limit].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' => {}
            None if !implicit_close => {
                return Some(InvokeScan::Open {
                    name: None,
                    header_complete: false,
                    open_call: None,
                })
            }
            _ => return None,
        }

        let Some(tag_end) = find_tag_end(&buffer[header_start..limit]).map(|rel| header_start + rel)
        else {
            if implicit_close {
                return Some(InvokeScan::Closed {
                    call: None,
                    end: limit,
                });
            }
            let attributes = parse_attributes(&buffer[header_start..limit]);
            return Some(InvokeScan::Open {
                name: attribute(&attributes, "name").and_then(|name| self.recognize(name)),
                header_complete: false,
                open_call: None,
            });
        };

        let attributes = parse_attributes(&buffer[header_start..tag_end]);
        let raw_name = attribute(&attributes, "name");
        let body_start = tag_end + 1;
        let (body_end, end) = match buffer[body_start..limit].find(INVOKE_CLOSE) {
            Some(rel) => (body_start + rel, body_start + rel + INVOKE_CLOSE.len()),
            None if implicit_close => (limit, limit),
            None => {
                let name = raw_name.and_then(|name| self.recognize(name));
                let open_call = name.as_deref().map(|kind| {
                    let body = settled_body(&buffer[body_start..limit], &[]);
                    call_from_arguments(kind, parse_parameters(body))
                });
                return Some(InvokeScan::Open {
                    name,
                    header_complete: true,
                    open_call,
                });
            }
        };

        let call = raw_name
            .and_then(complete_name)
            .map(|kind| build_call(&kind, parse_parameters(&buffer[body_start..body_end])));
        Some(InvokeScan::Closed { call, end })
    }

    fn scan_function(&self, buffer: &str, name_start: usize, finished: bool) -> MarkerScan {
        let Some(name_end) = buffer[name_start..].find('>').map(|rel| name_start + rel) else {
            if finished {
                let call = complete_name(&buffer[name_start..])
                    .map(|kind| build_call(&kind, Arguments::new()));
                return MarkerScan::Closed {
                    calls: call.into_iter().collect(),
                    end: buffer.len(),
                };
            }
            return MarkerScan::Open {
                calls: Vec::new(),
                name: self.recognize(&buffer[name_start..]),
                header_complete: false,
                open_call: None,
            };
        };

        let raw_name = &buffer[name_start..name_end];
        let body_start = name_end + 1;
        let (body_end, end) = match find_function_body_bounds(buffer, body_start) {
            Some(bounds) => bounds,
            None if finished => (buffer.len(), buffer.len()),
            None => {
                let name = self.recognize(raw_name);
                let open_call = name.as_deref().map(|kind| {
                    let body = settled_body(&buffer[body_start..], &[]);
                    call_from_arguments(kind, parse_parameters(body))
                });
                return MarkerScan::Open {
                    calls: Vec::new(),
                    name,
                    header_complete: true,
                    open_call,
                };
            }
        };

        let call = complete_name(raw_name)
            .map(|kind| build_call(&kind, parse_parameters(&buffer[body_start..body_end])));
        MarkerScan::Closed {
            calls: call.into_iter().collect(),
            end,
        }
    }

    fn scan_tag(
        &self,
        buffer: &str,
        header_start: usize,
        kind: &str,
        finished: bool,
    ) -> Option<MarkerScan> {
        match buffer[header_start..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
            None if !finished => return Some(MarkerScan::open_unnamed(Vec::new())),
            _ => return None,
        }

        let Some(tag_end) = find_tag_end(&buffer[header_start..]).map(|rel| header_start + rel)
        else {
            if finished {
                return None;
            }
            return Some(MarkerScan::Open {
                calls: Vec::new(),
                name: self.recognize(kind),
                header_complete: false,
                open_call: None,
            });
        };

        let header = buffer[header_start..tag_end].trim_end();
        let self_closing = header.ends_with('/');
        let attributes = parse_attributes(header.trim_end_matches('/'));

        if self_closing {
            return Some(MarkerScan::Closed {
                calls: vec![build_tag_call(kind, &attributes, "")],
                end: tag_end + 1,
            });
        }

        let close_tag = format!("</{kind}>");
        let body_start = tag_end + 1;
        let (body_end, end) = match buffer[body_start..].find(&close_tag) {
            Some(rel) => (body_start + rel, body_start + rel + close_tag.len()),
            None if finished => (buffer.len(), buffer.len()),
            None => {
                let name = self.recognize(kind);
                let open_call = name.as_ref().map(|_| {
                    let body = settled_body(&buffer[body_start..], &[close_tag.as_str()]);
                    call_from_arguments(kind, tag_arguments(kind, &attributes, body))
                });
                return Some(MarkerScan::Open {
                    calls: Vec::new(),
                    name,
                    header_complete: true,
                    open_call,
                });
            }
        };

        Some(MarkerScan::Closed {
            calls: vec![build_tag_call(
                kind,
                &attributes,
                &buffer[body_start..body_end],
            )],
            end,
        })
    }

    /// Name of an open tool, once enough of it is visible to trust.
    fn recognize(&self, raw: &str) -> Option<String> {
        let name = raw.trim().trim_matches('"').trim_matches('\'').trim();
        if name.contains('<') {
            tracing::debug!(name, "suppressed tool name with stray '<'");
            return None;
        }
        if name.chars().count() < self.min_tool_name_chars {
            return None;
        }
        Some(normalize_kind(name))
    }

    /// Start of a trailing fragment that could still grow into a marker.
    fn partial_marker_start(&self, tail: &str) -> Option<usize> {
        let fragment_start = tail.rfind('<')?;
        let fragment = &tail[fragment_start..];
        self.patterns
            .iter()
            .any(|pattern| pattern.len() > fragment.len() && pattern.starts_with(fragment))
            .then_some(fragment_start)
    }
}

enum InvokeScan {
    Closed {
        call: Option<ToolCall>,
        end: usize,
    },
    Open {
        name: Option<String>,
        header_complete: bool,
        open_call: Option<ToolCall>,
    },
}

fn complete_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if name.is_empty() || name.contains('<') {
        return None;
    }
    Some(normalize_kind(name))
}

/// Closed markup goes through the same normalize-then-extract path as
/// backend tool results.
fn build_call(kind: &str, arguments: Arguments) -> ToolCall {
    tracing::debug!(tool = kind, "tool call closed in stream");
    call_from_arguments(kind, arguments)
}

fn call_from_arguments(kind: &str, arguments: Arguments) -> ToolCall {
    let payload = json!({ "tool_name": kind, "arguments": Value::Object(arguments) });
    let normalized = payload::normalize(&payload);
    extract::extract(kind, None, &normalized)
}

fn build_tag_call(kind: &str, attributes: &[(String, String)], body: &str) -> ToolCall {
    build_call(kind, tag_arguments(kind, attributes, body))
}

fn tag_arguments(kind: &str, attributes: &[(String, String)], body: &str) -> Arguments {
    let mut arguments: Arguments = attributes
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    if body.contains("<parameter") {
        arguments.extend(parse_parameters(body));
    } else if !body.trim().is_empty() {
        let field = schema_for(kind)
            .and_then(|schema| schema.body_field)
            .unwrap_or("content");
        arguments
            .entry(field.to_string())
            .or_insert_with(|| Value::String(normalize_tagged_parameter_value(body)));
    }
    arguments
}

#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<Segment>,
    pending_text: String,
    clean_text: String,
}

impl SegmentBuilder {
    fn push_text(&mut self, text: &str) {
        self.pending_text.push_str(text);
        self.clean_text.push_str(text);
    }

    fn push_tool(&mut self, call: ToolCall) {
        self.flush_text();
        self.segments.push(Segment::Tool { call });
    }

    fn ends_with_tool(&self) -> bool {
        self.pending_text.is_empty() && matches!(self.segments.last(), Some(Segment::Tool { .. }))
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            self.segments.push(Segment::Text {
                content: std::mem::take(&mut self.pending_text),
            });
        }
    }

    fn finish(mut self) -> (String, Vec<Segment>) {
        self.flush_text();
        (self.clean_text, self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segmenter() -> Segmenter {
        Segmenter::new(&SegmenterConfig::default()).expect("default segmenter")
    }

    #[test]
    fn test_empty_buffer_is_idle() {
        let result = segmenter().segment("");
        assert_eq!(result.phase, StreamPhase::Idle);
        assert_eq!(result.state, StreamState::default());
    }

    #[test]
    fn test_plain_text_passes_through() {
        let result = segmenter().segment("Looking at the file now.");
        assert_eq!(result.phase, StreamPhase::ScanningText);
        assert_eq!(result.state.clean_text, "Looking at the file now.");
        assert_eq!(result.tool_calls().count(), 0);
    }

    #[test]
    fn test_open_invoke_reports_tool_name_and_prose_before_it() {
        let buffer = "Let me edit.\n<function_calls>\n<invoke name=\"str_replace\">\n<parameter name=\"file_path\">src/ma";
        let result = segmenter().segment(buffer);
        assert_eq!(result.phase, StreamPhase::ToolBodyStreaming);
        assert_eq!(result.state.clean_text, "Let me edit.\n");
        assert_eq!(result.state.open_tool_name.as_deref(), Some("str-replace"));
        assert!(result.state.is_open_tool_streaming);
    }

    #[test]
    fn test_short_or_garbled_names_are_not_recognized() {
        let segmenter = segmenter();
        let short = segmenter.segment("<function_calls><invoke name=\"st");
        assert_eq!(short.phase, StreamPhase::AwaitingToolName);
        assert_eq!(short.state.open_tool_name, None);
        assert!(!short.state.is_open_tool_streaming);

        let garbled = segmenter.segment("<function=ab<c");
        assert_eq!(garbled.state.open_tool_name, None);
        assert_eq!(garbled.phase, StreamPhase::AwaitingToolName);

        let partial = segmenter.segment("<function_calls><invoke name=\"web_sea");
        assert_eq!(partial.phase, StreamPhase::ToolNameRecognized);
        assert_eq!(partial.state.open_tool_name.as_deref(), Some("web-sea"));
    }

    #[test]
    fn test_closed_block_promotes_every_invoke() {
        let buffer = concat!(
            "Done.<function_calls>",
            "<invoke name=\"web_search\"><parameter name=\"query\">rust</parameter></invoke>",
            "<invoke name=\"ask\"><parameter name=\"text\">ok?</parameter>",
            "<parameter name=\"attachments\">a.md, b.md</parameter></invoke>",
            "</function_calls> After."
        );
        let result = segmenter().segment(buffer);
        let calls: Vec<_> = result.tool_calls().collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, "web-search");
        assert_eq!(calls[0].text("query"), Some("rust"));
        assert_eq!(calls[1].attachments(), vec!["a.md", "b.md"]);
        assert_eq!(result.state.clean_text, "Done. After.");
        assert_eq!(result.state.open_tool_name, None);
        assert_eq!(result.phase, StreamPhase::ScanningText);
    }

    #[test]
    fn test_function_tag_dialect() {
        let buffer = "<function=str_replace>\n<parameter=path>\na.rs\n</parameter>\n<parameter=old_str>\nx\n</parameter>\n<parameter=new_str>\ny\n</parameter>\n</function>";
        let result = segmenter().segment(buffer);
        assert_eq!(result.phase, StreamPhase::ToolComplete);
        let call = result.tool_calls().next().expect("one call");
        assert_eq!(call.text("file_path"), Some("a.rs"));
        assert_eq!(call.text("old_str"), Some("x"));
        assert_eq!(call.text("new_str"), Some("y"));
    }

    #[test]
    fn test_legacy_tag_dialect() {
        let segmenter = segmenter();
        let streaming = segmenter.segment("Writing <create-file file_path=\"notes.md\">hello");
        assert_eq!(streaming.phase, StreamPhase::ToolBodyStreaming);
        assert_eq!(
            streaming.state.open_tool_name.as_deref(),
            Some("create-file")
        );
        assert_eq!(streaming.state.clean_text, "Writing ");

        let done = segmenter.segment(
            "Writing <create-file file_path=\"notes.md\">\nhello\n</create-file>",
        );
        let call = done.tool_calls().next().expect("one call");
        assert_eq!(call.kind, "create-file");
        assert_eq!(call.text("file_path"), Some("notes.md"));
        assert_eq!(call.text("file_contents"), Some("hello"));

        let self_closing = segmenter.segment("<see-image file_path=\"a.png\" />");
        assert_eq!(
            self_closing.tool_calls().next().and_then(|c| c.text("file_path")),
            Some("a.png")
        );
    }

    #[test]
    fn test_tag_name_prefix_in_prose_is_text() {
        let result = segmenter().segment("I will <asking> nothing");
        assert_eq!(result.state.clean_text, "I will <asking> nothing");
        assert_eq!(result.phase, StreamPhase::ScanningText);
    }

    #[test]
    fn test_trailing_marker_fragment_is_held_back() {
        let segmenter = segmenter();
        let held = segmenter.segment("Checking <func");
        assert_eq!(held.state.clean_text, "Checking ");
        assert_eq!(held.phase, StreamPhase::AwaitingToolName);

        let released = segmenter.segment("a < b");
        assert_eq!(released.state.clean_text, "a < b");

        let finished = segmenter.finish("Checking <func");
        assert_eq!(finished.state.clean_text, "Checking <func");
        assert_eq!(finished.phase, StreamPhase::ScanningText);
    }

    #[test]
    fn test_finish_closes_open_tool_at_end_of_buffer() {
        let result = segmenter().finish("<function=execute_command>\n<parameter=command>\nls -la");
        let call = result.tool_calls().next().expect("promoted call");
        assert_eq!(call.kind, "execute-command");
        assert_eq!(call.text("command"), Some("ls -la"));
        assert_eq!(result.phase, StreamPhase::ScanningText);
    }

    #[test]
    fn test_extra_tool_tags_are_recognized() {
        let config = SegmenterConfig {
            extra_tool_tags: vec!["sb_files_tool".to_string()],
            ..SegmenterConfig::default()
        };
        let segmenter = Segmenter::new(&config).expect("segmenter");
        let result = segmenter.segment("<sb-files-tool path=\"x\">body</sb-files-tool>");
        let call = result.tool_calls().next().expect("call");
        assert_eq!(call.kind, "sb-files-tool");
        assert_eq!(call.text("content"), Some("body"));
    }

    #[test]
    fn test_incremental_feed_matches_full_feed() {
        let buffer = "Plan:\n<function_calls>\n<invoke name=\"create_file\">\n<parameter name=\"file_path\">a.txt</parameter>\n<parameter name=\"file_contents\">hi</parameter>\n</invoke>\n</function_calls>\nThen <ask>Ready?</ask> done";
        let segmenter = segmenter();
        let mut grown = String::new();
        let mut last = segmenter.segment(&grown);
        for ch in buffer.chars() {
            grown.push(ch);
            last = segmenter.segment(&grown);
        }
        assert_eq!(last, segmenter.segment(buffer));
        assert_eq!(last.tool_calls().count(), 2);
        assert_eq!(last.state.clean_text, "Plan:\n\nThen  done");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let zero = SegmenterConfig {
            min_tool_name_chars: 0,
            ..SegmenterConfig::default()
        };
        assert!(matches!(
            Segmenter::new(&zero),
            Err(ConfigError::ToolNameThreshold { value: 0, .. })
        ));

        let bad_tag = SegmenterConfig {
            extra_tool_tags: vec!["bad tag!".to_string()],
            ..SegmenterConfig::default()
        };
        assert!(matches!(
            Segmenter::new(&bad_tag),
            Err(ConfigError::InvalidToolTag(tag)) if tag == "bad tag!"
        ));
    }

    #[test]
    fn test_open_tool_exposes_provisional_call() {
        let live = segmenter().segment(
            "<function_calls><invoke name=\"create_file\"><parameter name=\"file_path\">a.md</parameter><parameter name=\"file_contents\">hello wor",
        );
        assert_eq!(live.phase, StreamPhase::ToolBodyStreaming);
        assert_eq!(live.tool_calls().count(), 0);
        let open = live.open_call.expect("provisional call");
        assert_eq!(open.kind, "create-file");
        assert_eq!(open.text("file_path"), Some("a.md"));
        assert_eq!(open.text("file_contents"), Some("hello wor"));
    }

    #[test]
    fn test_provisional_call_arguments_only_grow() {
        let buffer = "<function_calls><invoke name=\"create_file\"><parameter name=\"file_path\">notes/a.md</parameter><parameter name=\"file_contents\">line one, line two</parameter></invoke></function_calls>";
        let segmenter = segmenter();
        let mut grown = String::new();
        let mut previous: Option<ToolCall> = None;
        let mut provisional_seen = 0usize;

        for ch in buffer.chars() {
            grown.push(ch);
            let live = segmenter.segment(&grown);
            if live.open_call.is_some() {
                provisional_seen += 1;
            }
            let current = live
                .open_call
                .clone()
                .or_else(|| live.tool_calls().next().cloned());
            if let (Some(before), Some(after)) = (&previous, &current) {
                for (key, value) in &before.arguments {
                    let before_text = value.as_str().unwrap_or_default();
                    let after_text = after.text(key).unwrap_or_default();
                    assert!(
                        after_text.starts_with(before_text),
                        "{key} shrank: {before_text:?} -> {after_text:?}"
                    );
                }
            }
            if current.is_some() {
                previous = current;
            }
        }

        assert!(provisional_seen > 0);
        let done = segmenter.segment(buffer);
        assert_eq!(done.open_call, None);
        assert_eq!(
            done.tool_calls().next().and_then(|call| call.text("file_contents")),
            Some("line one, line two")
        );
    }

    #[test]
    fn test_open_legacy_tag_streams_body() {
        let live = segmenter().segment("Question: <ask>Deploy now?</as");
        assert_eq!(live.phase, StreamPhase::ToolBodyStreaming);
        let open = live.open_call.expect("provisional call");
        assert_eq!(open.kind, "ask");
        assert_eq!(open.text("text"), Some("Deploy now?"));
    }
}

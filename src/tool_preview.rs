use crate::edit_diff::{format_diff_hunks, EditPreview, DEFAULT_EDIT_DIFF_CONTEXT_LINES};
use crate::registry::ToolViewRegistry;
use crate::types::ToolCall;
use crate::util::text_stats;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPreviewStyle {
    Compact,
    Structured,
}

impl ToolPreviewStyle {
    fn diff_indent(self) -> &'static str {
        match self {
            ToolPreviewStyle::Compact => "  ",
            ToolPreviewStyle::Structured => "    ",
        }
    }
}

/// Text rendering of one tool kind.
pub trait ToolView: Send + Sync + fmt::Debug {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String;
}

pub type ViewHandle = Arc<dyn ToolView>;

pub fn preview_lines(
    marker: Option<char>,
    text: &str,
    max_lines: usize,
    start_line: usize,
    indent: &str,
) -> String {
    if text.is_empty() {
        return match marker {
            Some(marker) => format!("{indent}{start_line} {marker} <empty>\n"),
            None => format!("{indent}{start_line}   <empty>\n"),
        };
    }

    let mut out = String::new();
    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().take(max_lines).enumerate() {
        let line_number = start_line + idx;
        match marker {
            Some(marker) => out.push_str(&format!("{indent}{line_number} {marker} {line}\n")),
            None => out.push_str(&format!("{indent}{line_number}   {line}\n")),
        }
    }
    if lines.len() > max_lines {
        out.push_str(&format!(
            "{indent}... ({} more lines)\n",
            lines.len() - max_lines
        ));
    }
    out
}

fn path_or_missing(call: &ToolCall) -> &str {
    call.text("file_path").unwrap_or("<missing>")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EditView {
    pub context_lines: usize,
}

impl ToolView for EditView {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String {
        match call.edit_preview() {
            EditPreview::Diff {
                file_path,
                lines,
                stats,
            } => {
                let mut out = String::new();
                out.push_str(&format!(
                    "path: {}\n",
                    file_path.as_deref().unwrap_or("<missing>")
                ));
                out.push_str(&format!(
                    "change: +{} -{}\n",
                    stats.additions, stats.deletions
                ));
                out.push_str(&format_diff_hunks(
                    &lines,
                    style.diff_indent(),
                    self.context_lines,
                ));
                out
            }
            EditPreview::Unavailable { missing } => format!(
                "path: {}\ncannot extract diff: missing {}\n",
                path_or_missing(call),
                missing.join(", ")
            ),
            EditPreview::NotAnEdit => DefaultView.render(call, style),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileWriteView {
    pub max_lines: usize,
}

const WRITE_CONTENT_FIELDS: [&str; 2] = ["file_contents", "code_edit"];

impl ToolView for FileWriteView {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String {
        let content = WRITE_CONTENT_FIELDS
            .iter()
            .find_map(|field| call.text(field))
            .unwrap_or("");
        let (chars, lines) = text_stats(content);

        let mut out = String::new();
        out.push_str(&format!("path: {}\n", path_or_missing(call)));
        if let Some(instructions) = call.text("instructions") {
            out.push_str(&format!("instructions: {instructions}\n"));
        }
        out.push_str(&format!("content: {chars} chars, {lines} lines\n"));
        out.push_str(&preview_lines(
            Some('+'),
            content,
            self.max_lines,
            1,
            style.diff_indent(),
        ));
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandView {
    pub max_output_lines: usize,
}

impl ToolView for CommandView {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String {
        let mut out = format!("$ {}\n", call.text("command").unwrap_or("<missing>"));
        if let Some(session) = call.text("session_name") {
            out.push_str(&format!("session: {session}\n"));
        }
        if let Some(output) = call.output_text().filter(|output| !output.is_empty()) {
            out.push_str(&preview_lines(
                None,
                &output,
                self.max_output_lines,
                1,
                style.diff_indent(),
            ));
        }
        out
    }
}

/// `key: value` lines for a fixed list of resolved fields.
#[derive(Debug, Clone, Copy)]
pub struct FieldsView {
    pub fields: &'static [&'static str],
}

impl ToolView for FieldsView {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String {
        let pairs: Vec<String> = self
            .fields
            .iter()
            .filter_map(|field| {
                call.value(field)
                    .map(|value| format!("{field}: {}", display_value(value)))
            })
            .collect();
        if pairs.is_empty() {
            return DefaultView.render(call, style);
        }
        match style {
            ToolPreviewStyle::Compact => pairs.join("  "),
            ToolPreviewStyle::Structured => pairs.join("\n"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MessageView;

impl ToolView for MessageView {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String {
        let mut out = call.text("text").unwrap_or("").to_string();
        let attachments = call.attachments();
        if !attachments.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("attachments ({}):", attachments.len()));
            for attachment in attachments {
                out.push_str(&format!("\n{}- {attachment}", style.diff_indent()));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultView;

impl ToolView for DefaultView {
    fn render(&self, call: &ToolCall, style: ToolPreviewStyle) -> String {
        let input = Value::Object(call.arguments.clone());
        match style {
            ToolPreviewStyle::Structured if call.arguments.is_empty() => {
                "(no arguments)".to_string()
            }
            ToolPreviewStyle::Structured => {
                serde_json::to_string_pretty(&input).unwrap_or_else(|_| input.to_string())
            }
            ToolPreviewStyle::Compact => input.to_string(),
        }
    }
}

fn fields(fields: &'static [&'static str]) -> ViewHandle {
    Arc::new(FieldsView { fields })
}

/// Registry seeded from the built-in table.
pub fn default_registry(context_lines: usize) -> ToolViewRegistry<ViewHandle> {
    let edit: ViewHandle = Arc::new(EditView { context_lines });
    let write: ViewHandle = Arc::new(FileWriteView { max_lines: 40 });
    let command: ViewHandle = Arc::new(CommandView {
        max_output_lines: 20,
    });
    let message: ViewHandle = Arc::new(MessageView);

    let table: Vec<(&str, ViewHandle)> = vec![
        ("str-replace", edit),
        ("create-file", write.clone()),
        ("full-file-rewrite", write.clone()),
        ("edit-file", write),
        ("delete-file", fields(&["file_path"])),
        ("see-image", fields(&["file_path"])),
        ("execute-command", command),
        ("check-command-output", fields(&["session_name"])),
        ("terminate-command", fields(&["session_name"])),
        ("web-search", fields(&["query", "num_results"])),
        ("crawl-webpage", fields(&["url"])),
        ("scrape-webpage", fields(&["url"])),
        ("browser-navigate-to", fields(&["url"])),
        ("browser-act", fields(&["action", "text"])),
        ("browser-extract-content", fields(&["instruction"])),
        ("browser-screenshot", fields(&["name"])),
        ("ask", message.clone()),
        ("complete", message),
        ("deploy", fields(&["name", "directory_path"])),
        ("expose-port", fields(&["port"])),
        ("image-edit-or-generate", fields(&["prompt", "mode", "image_path"])),
    ];
    ToolViewRegistry::from_table(Arc::new(DefaultView) as ViewHandle, table)
}

impl Default for ToolViewRegistry<ViewHandle> {
    fn default() -> Self {
        default_registry(DEFAULT_EDIT_DIFF_CONTEXT_LINES)
    }
}

/// Render through the registry, prefixing failed calls with their error.
pub fn render_tool_call(
    registry: &ToolViewRegistry<ViewHandle>,
    call: &ToolCall,
    style: ToolPreviewStyle,
) -> String {
    let body = registry.get(&call.kind).render(call, style);
    if call.is_success {
        return body;
    }
    let error = call.error_message.as_deref().unwrap_or("tool failed");
    format!("error: {error}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::types::{ExecutionResult, NormalizedExecution};
    use serde_json::json;

    fn call(kind: &str, arguments: Value) -> ToolCall {
        let normalized = NormalizedExecution {
            tool_name: None,
            arguments: arguments.as_object().cloned().unwrap_or_default(),
            result: ExecutionResult::default(),
        };
        extract(kind, None, &normalized)
    }

    #[test]
    fn test_preview_lines_with_and_without_marker() {
        assert_eq!(preview_lines(Some('+'), "", 10, 1, "  "), "  1 + <empty>\n");
        assert_eq!(
            preview_lines(None, "a\nb", 10, 1, "  "),
            "  1   a\n  2   b\n"
        );
        assert_eq!(
            preview_lines(None, "a\nb\nc", 1, 1, ""),
            "1   a\n... (2 more lines)\n"
        );
    }

    #[test]
    fn test_edit_view_renders_pairwise_hunks() {
        let registry = ToolViewRegistry::default();
        let edit = call(
            "str_replace",
            json!({ "path": "src/lib.rs", "old_string": "a\nb", "new_string": "a\nc" }),
        );
        let rendered = render_tool_call(&registry, &edit, ToolPreviewStyle::Compact);
        assert!(rendered.starts_with("path: src/lib.rs\nchange: +1 -1\n"));
        assert!(rendered.contains("  2 - b"));
        assert!(rendered.contains("  2 + c"));
    }

    #[test]
    fn test_edit_view_reports_missing_fields() {
        let registry = ToolViewRegistry::default();
        let edit = call("str-replace", json!({ "file_path": "a.rs" }));
        let rendered = render_tool_call(&registry, &edit, ToolPreviewStyle::Structured);
        assert_eq!(
            rendered,
            "path: a.rs\ncannot extract diff: missing old_str, new_str\n"
        );
    }

    #[test]
    fn test_unknown_kind_uses_default_view() {
        let registry = ToolViewRegistry::default();
        let empty = call("mystery-tool", json!({}));
        assert_eq!(
            render_tool_call(&registry, &empty, ToolPreviewStyle::Structured),
            "(no arguments)"
        );
        let with_args = call("mystery-tool", json!({ "a": 1 }));
        assert_eq!(
            render_tool_call(&registry, &with_args, ToolPreviewStyle::Compact),
            "{\"a\":1}"
        );
    }

    #[test]
    fn test_message_view_lists_attachments() {
        let registry = ToolViewRegistry::default();
        let ask = call("ask", json!({ "text": "Look", "attachments": "a.png, b.png" }));
        assert_eq!(
            render_tool_call(&registry, &ask, ToolPreviewStyle::Compact),
            "Look\nattachments (2):\n  - a.png\n  - b.png"
        );
    }

    #[test]
    fn test_failed_call_is_prefixed_with_error() {
        let registry = ToolViewRegistry::default();
        let mut failed = call("web-search", json!({ "query": "rust" }));
        failed.is_success = false;
        failed.error_message = Some("rate limited".to_string());
        assert_eq!(
            render_tool_call(&registry, &failed, ToolPreviewStyle::Structured),
            "error: rate limited\nquery: rust"
        );
    }

    #[test]
    fn test_command_view_includes_output() {
        let normalized = NormalizedExecution {
            tool_name: None,
            arguments: json!({ "cmd": "ls" }).as_object().cloned().unwrap(),
            result: ExecutionResult {
                output: Some(json!("a.txt\nb.txt")),
                ..ExecutionResult::default()
            },
        };
        let command = extract("execute-command", None, &normalized);
        let rendered = CommandView {
            max_output_lines: 1,
        }
        .render(&command, ToolPreviewStyle::Compact);
        assert_eq!(rendered, "$ ls\n  1   a.txt\n  ... (1 more lines)\n");
    }
}

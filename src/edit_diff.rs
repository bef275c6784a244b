use crate::types::ToolCall;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Added,
    Removed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    pub content: String,
    pub line_number: usize,
}

impl DiffLine {
    fn new(kind: DiffKind, content: &str, line_number: usize) -> Self {
        Self {
            kind,
            content: content.to_string(),
            line_number,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

pub const DEFAULT_EDIT_DIFF_CONTEXT_LINES: usize = 2;

/// Fixed-index line comparison.
///
/// Line `i` of the old text is compared with line `i` of the new text; a
/// differing pair is emitted as `Removed` then `Added` under one shared line
/// number. An insertion mid-file therefore shows every later line as a
/// removed/added pair. This is not an LCS diff.
pub fn diff_lines(old_text: &str, new_text: &str) -> Vec<DiffLine> {
    let old_lines: Vec<&str> = old_text.split('\n').collect();
    let new_lines: Vec<&str> = new_text.split('\n').collect();
    let total = old_lines.len().max(new_lines.len());

    let mut out = Vec::with_capacity(total * 2);
    let mut line_number = 1usize;
    for index in 0..total {
        match (old_lines.get(index), new_lines.get(index)) {
            (Some(old), Some(new)) if old == new => {
                out.push(DiffLine::new(DiffKind::Unchanged, old, line_number));
            }
            (Some(old), Some(new)) => {
                out.push(DiffLine::new(DiffKind::Removed, old, line_number));
                out.push(DiffLine::new(DiffKind::Added, new, line_number));
            }
            (Some(old), None) => out.push(DiffLine::new(DiffKind::Removed, old, line_number)),
            (None, Some(new)) => out.push(DiffLine::new(DiffKind::Added, new, line_number)),
            (None, None) => continue,
        }
        line_number += 1;
    }
    out
}

/// Every line of `text` as an addition, for file-creation tools.
pub fn addition_lines(text: &str) -> Vec<DiffLine> {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| DiffLine::new(DiffKind::Added, line, index + 1))
        .collect()
}

pub fn diff_stats(lines: &[DiffLine]) -> DiffStats {
    lines
        .iter()
        .fold(DiffStats::default(), |mut stats, line| {
            match line.kind {
                DiffKind::Added => stats.additions += 1,
                DiffKind::Removed => stats.deletions += 1,
                DiffKind::Unchanged => {}
            }
            stats
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditPreview {
    Diff {
        file_path: Option<String>,
        lines: Vec<DiffLine>,
        stats: DiffStats,
    },
    /// The call is an edit but lacks the fields a diff needs.
    Unavailable { missing: Vec<&'static str> },
    NotAnEdit,
}

pub fn edit_preview(call: &ToolCall) -> EditPreview {
    let file_path = call.text("file_path").map(str::to_string);
    match call.kind.as_str() {
        "str-replace" => {
            let old_str = call.text("old_str");
            let new_str = call.text("new_str");
            match (old_str, new_str) {
                (Some(old_str), Some(new_str)) => {
                    let lines = diff_lines(old_str, new_str);
                    let stats = diff_stats(&lines);
                    EditPreview::Diff {
                        file_path,
                        lines,
                        stats,
                    }
                }
                _ => {
                    let missing = [("old_str", old_str), ("new_str", new_str)]
                        .into_iter()
                        .filter(|(_, value)| value.is_none())
                        .map(|(name, _)| name)
                        .collect();
                    EditPreview::Unavailable { missing }
                }
            }
        }
        "create-file" | "full-file-rewrite" => match call.text("file_contents") {
            Some(contents) => {
                let lines = addition_lines(contents);
                let stats = diff_stats(&lines);
                EditPreview::Diff {
                    file_path,
                    lines,
                    stats,
                }
            }
            None => EditPreview::Unavailable {
                missing: vec!["file_contents"],
            },
        },
        _ => EditPreview::NotAnEdit,
    }
}

pub fn format_edit_hunks(
    old_str: &str,
    new_str: &str,
    indent: &str,
    context_lines: usize,
) -> String {
    format_diff_hunks(&diff_lines(old_str, new_str), indent, context_lines)
}

pub fn format_diff_hunks(diff_lines: &[DiffLine], indent: &str, context_lines: usize) -> String {
    let hunks = build_hunk_ranges(diff_lines, context_lines);

    if hunks.is_empty() {
        if diff_lines.is_empty() {
            return format!("{indent}1   <empty>\n");
        }
        return format!("{indent}... no modified lines ...\n");
    }

    let mut out = String::new();
    for (index, (start, end)) in hunks.iter().copied().enumerate() {
        if index > 0 {
            out.push_str(&format!("{indent}...\n"));
        }

        let hunk_lines = &diff_lines[start..end];
        let first_line = hunk_lines.first().map(|line| line.line_number).unwrap_or(1);
        let old_count = hunk_lines
            .iter()
            .filter(|line| line.kind != DiffKind::Added)
            .count();
        let new_count = hunk_lines
            .iter()
            .filter(|line| line.kind != DiffKind::Removed)
            .count();
        out.push_str(&format!(
            "{indent}@@ -{first_line},{old_count} +{first_line},{new_count} @@\n"
        ));

        for line in hunk_lines {
            let marker = match line.kind {
                DiffKind::Unchanged => ' ',
                DiffKind::Removed => '-',
                DiffKind::Added => '+',
            };
            let text = if line.content.is_empty() {
                "<empty>"
            } else {
                line.content.as_str()
            };
            out.push_str(&format!("{indent}{} {marker} {text}\n", line.line_number));
        }
    }

    out
}

fn build_hunk_ranges(diff_lines: &[DiffLine], context_lines: usize) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for (index, line) in diff_lines.iter().enumerate() {
        if line.kind == DiffKind::Unchanged {
            continue;
        }

        let start = index.saturating_sub(context_lines);
        let end = (index + context_lines + 1).min(diff_lines.len());
        if let Some((_, previous_end)) = ranges.last_mut() {
            if start <= *previous_end {
                *previous_end = (*previous_end).max(end);
                continue;
            }
        }
        ranges.push((start, end));
    }

    ranges
}

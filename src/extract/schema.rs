#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string; numbers and booleans are stringified.
    Text,
    /// Sequence of strings or one comma-separated string.
    Attachments,
    /// Any non-null JSON value.
    Value,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn text(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            kind: FieldKind::Text,
        }
    }

    const fn value(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            kind: FieldKind::Value,
        }
    }

    const fn attachments(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            kind: FieldKind::Attachments,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSchema {
    pub kind: &'static str,
    /// Field that receives the body of a bare `<kind ...>body</kind>` tag.
    pub body_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

impl ToolSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

const FILE_PATH: FieldSpec = FieldSpec::text("file_path", &["file_path", "path", "target_file"]);
const OLD_STR: FieldSpec = FieldSpec::text("old_str", &["old_str", "old_string", "old", "old_text"]);
const NEW_STR: FieldSpec = FieldSpec::text("new_str", &["new_str", "new_string", "new", "new_text"]);
const FILE_CONTENTS: FieldSpec = FieldSpec::text(
    "file_contents",
    &["file_contents", "content", "contents", "text"],
);
const COMMAND: FieldSpec = FieldSpec::text("command", &["command", "cmd"]);
const SESSION_NAME: FieldSpec = FieldSpec::text("session_name", &["session_name", "session"]);
const QUERY: FieldSpec = FieldSpec::text("query", &["query", "q", "search_query"]);
const URL: FieldSpec = FieldSpec::text("url", &["url", "urls", "webpage_url"]);
const TEXT: FieldSpec = FieldSpec::text("text", &["text", "message", "question", "content"]);
const ATTACHMENTS: FieldSpec =
    FieldSpec::attachments("attachments", &["attachments", "attachment", "files"]);
const NAME: FieldSpec = FieldSpec::text("name", &["name"]);

pub const TOOL_SCHEMAS: &[ToolSchema] = &[
    ToolSchema {
        kind: "str-replace",
        body_field: None,
        fields: &[FILE_PATH, OLD_STR, NEW_STR],
    },
    ToolSchema {
        kind: "create-file",
        body_field: Some("file_contents"),
        fields: &[FILE_PATH, FILE_CONTENTS],
    },
    ToolSchema {
        kind: "full-file-rewrite",
        body_field: Some("file_contents"),
        fields: &[FILE_PATH, FILE_CONTENTS],
    },
    ToolSchema {
        kind: "edit-file",
        body_field: Some("code_edit"),
        fields: &[
            FILE_PATH,
            FieldSpec::text("instructions", &["instructions", "instruction"]),
            FieldSpec::text("code_edit", &["code_edit", "edit", "content"]),
        ],
    },
    ToolSchema {
        kind: "delete-file",
        body_field: None,
        fields: &[FILE_PATH],
    },
    ToolSchema {
        kind: "execute-command",
        body_field: Some("command"),
        fields: &[
            COMMAND,
            SESSION_NAME,
            FieldSpec::text("folder", &["folder", "cwd", "working_directory"]),
            FieldSpec::value("blocking", &["blocking"]),
            FieldSpec::value("timeout", &["timeout"]),
        ],
    },
    ToolSchema {
        kind: "check-command-output",
        body_field: None,
        fields: &[SESSION_NAME],
    },
    ToolSchema {
        kind: "terminate-command",
        body_field: None,
        fields: &[SESSION_NAME],
    },
    ToolSchema {
        kind: "web-search",
        body_field: Some("query"),
        fields: &[
            QUERY,
            FieldSpec::value("num_results", &["num_results", "limit"]),
        ],
    },
    ToolSchema {
        kind: "crawl-webpage",
        body_field: Some("url"),
        fields: &[URL],
    },
    ToolSchema {
        kind: "scrape-webpage",
        body_field: Some("url"),
        fields: &[URL],
    },
    ToolSchema {
        kind: "browser-navigate-to",
        body_field: Some("url"),
        fields: &[URL],
    },
    ToolSchema {
        kind: "browser-act",
        body_field: Some("action"),
        fields: &[
            FieldSpec::text("action", &["action", "instruction"]),
            FieldSpec::text("text", &["text", "value"]),
        ],
    },
    ToolSchema {
        kind: "browser-extract-content",
        body_field: Some("instruction"),
        fields: &[FieldSpec::text("instruction", &["instruction", "goal"])],
    },
    ToolSchema {
        kind: "browser-screenshot",
        body_field: None,
        fields: &[NAME],
    },
    ToolSchema {
        kind: "ask",
        body_field: Some("text"),
        fields: &[TEXT, ATTACHMENTS],
    },
    ToolSchema {
        kind: "complete",
        body_field: Some("text"),
        fields: &[TEXT, ATTACHMENTS],
    },
    ToolSchema {
        kind: "deploy",
        body_field: None,
        fields: &[
            NAME,
            FieldSpec::text("directory_path", &["directory_path", "directory", "path"]),
        ],
    },
    ToolSchema {
        kind: "expose-port",
        body_field: Some("port"),
        fields: &[FieldSpec::value("port", &["port"])],
    },
    ToolSchema {
        kind: "see-image",
        body_field: None,
        fields: &[FILE_PATH],
    },
    ToolSchema {
        kind: "image-edit-or-generate",
        body_field: Some("prompt"),
        fields: &[
            FieldSpec::text("prompt", &["prompt", "description"]),
            FieldSpec::text("mode", &["mode"]),
            FieldSpec::text("image_path", &["image_path", "path", "image"]),
        ],
    },
];

pub fn schema_for(kind: &str) -> Option<&'static ToolSchema> {
    TOOL_SCHEMAS.iter().find(|schema| schema.kind == kind)
}

pub fn known_kinds() -> impl Iterator<Item = &'static str> {
    TOOL_SCHEMAS.iter().map(|schema| schema.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::is_kebab_identifier;
    use std::collections::HashSet;

    #[test]
    fn test_schema_kinds_are_unique_kebab_identifiers() {
        let mut seen = HashSet::new();
        for kind in known_kinds() {
            assert!(is_kebab_identifier(kind), "{kind}");
            assert!(seen.insert(kind), "duplicate schema for {kind}");
        }
    }

    #[test]
    fn test_body_field_is_declared() {
        for schema in TOOL_SCHEMAS {
            if let Some(body) = schema.body_field {
                assert!(schema.field(body).is_some(), "{}", schema.kind);
            }
        }
    }
}

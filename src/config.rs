use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::edit_diff::DEFAULT_EDIT_DIFF_CONTEXT_LINES;
use crate::logging::{DEBUG_PAYLOAD_ENV, DEFAULT_LOG_FILTER, LOG_FILTER_ENV, LOG_PATH_ENV};
use crate::stream::{SegmenterConfig, DEFAULT_MIN_TOOL_NAME_CHARS};
use crate::util::parse_bool_flag;

const MIN_TOOL_NAME_CHARS_ENV: &str = "TOOLSTREAM_MIN_TOOL_NAME_CHARS";
const EXTRA_TOOL_TAGS_ENV: &str = "TOOLSTREAM_EXTRA_TOOL_TAGS";
const DIFF_CONTEXT_LINES_ENV: &str = "TOOLSTREAM_DIFF_CONTEXT_LINES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub min_tool_name_chars: usize,
    pub extra_tool_tags: Vec<String>,
    pub diff_context_lines: usize,
    pub debug_payload: bool,
    pub log_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_tool_name_chars: DEFAULT_MIN_TOOL_NAME_CHARS,
            extra_tool_tags: Vec::new(),
            diff_context_lines: DEFAULT_EDIT_DIFF_CONTEXT_LINES,
            debug_payload: false,
            log_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let min_tool_name_chars = env_usize(MIN_TOOL_NAME_CHARS_ENV)?
            .unwrap_or(defaults.min_tool_name_chars);
        let diff_context_lines =
            env_usize(DIFF_CONTEXT_LINES_ENV)?.unwrap_or(defaults.diff_context_lines);
        let extra_tool_tags = std::env::var(EXTRA_TOOL_TAGS_ENV)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let debug_payload = std::env::var(DEBUG_PAYLOAD_ENV)
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(false);
        let log_path = std::env::var(LOG_PATH_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_filter = std::env::var(LOG_FILTER_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            min_tool_name_chars,
            extra_tool_tags,
            diff_context_lines,
            debug_payload,
            log_path,
            log_filter,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.segmenter_config()
            .validate()
            .context("invalid segmenter settings")?;
        Ok(())
    }

    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            min_tool_name_chars: self.min_tool_name_chars,
            extra_tool_tags: self.extra_tool_tags.clone(),
        }
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} must be a non-negative integer, got '{v}'")),
        _ => Ok(None),
    }
}

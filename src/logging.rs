use crate::config::Config;
use crate::error::NormalizeError;
use crate::types::RawPayload;
use crate::util::parse_bool_str;
use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "toolstream=info";
pub(crate) const LOG_FILTER_ENV: &str = "TOOLSTREAM_LOG";
pub(crate) const LOG_PATH_ENV: &str = "TOOLSTREAM_LOG_PATH";
pub(crate) const DEBUG_PAYLOAD_ENV: &str = "TOOLSTREAM_DEBUG_PAYLOAD";

static DEBUG_PAYLOAD: AtomicBool = AtomicBool::new(false);

pub fn debug_payload_enabled() -> bool {
    DEBUG_PAYLOAD.load(Ordering::Relaxed)
        || std::env::var(DEBUG_PAYLOAD_ENV)
            .ok()
            .and_then(|v| parse_bool_str(&v))
            .unwrap_or(false)
}

/// Install the global subscriber. Logs go to `log_path` when set, else stderr.
pub fn init(config: &Config) -> Result<()> {
    DEBUG_PAYLOAD.store(config.debug_payload, Ordering::Relaxed);

    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter '{}'", config.log_filter))?;

    let writer = match config.log_path.as_deref() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.log_path.is_none())
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

pub fn emit_payload_parse_failure(raw: RawPayload<'_>, err: &NormalizeError) {
    if !debug_payload_enabled() {
        tracing::debug!(error = %err, "payload not recognized");
        return;
    }
    tracing::debug!(error = %err, payload = %format_raw_payload(raw), "payload not recognized");
}

fn format_raw_payload(raw: RawPayload<'_>) -> String {
    match raw {
        RawPayload::Text(text) => text.to_string(),
        RawPayload::Json(value) => serde_json::to_string_pretty(value)
            .unwrap_or_else(|_| "<payload serialization error>".to_string()),
    }
}

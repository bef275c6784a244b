//! Replays a saved assistant response or transcript through the extractor.
//!
//! Usage:
//!   toolscan stream response.txt --chunk-size 16
//!   toolscan messages transcript.jsonl

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use toolstream::config::Config;
use toolstream::message::extract_tool_calls;
use toolstream::stream::{Segmentation, Segmenter};
use toolstream::tool_preview::{default_registry, render_tool_call, ToolPreviewStyle};
use toolstream::types::{AgentMessage, Segment, StreamPhase};

#[derive(Parser, Debug)]
#[command(name = "toolscan", about = "Inspect tool calls in agent output")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Preview layout for rendered tool calls
    #[arg(long, value_enum, default_value_t = Style::Structured, global = true)]
    style: Style,

    /// Print JSON instead of rendered previews
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a raw assistant response through the segmenter chunk by chunk
    Stream {
        /// Input file, or `-` for stdin
        file: PathBuf,
        /// Characters appended per step
        #[arg(long, default_value_t = 32)]
        chunk_size: usize,
    },
    /// Extract tool calls from a JSON array or JSON-lines transcript
    Messages {
        /// Input file, or `-` for stdin
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Style {
    Compact,
    Structured,
}

impl From<Style> for ToolPreviewStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Compact => ToolPreviewStyle::Compact,
            Style::Structured => ToolPreviewStyle::Structured,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    config.validate()?;
    toolstream::logging::init(&config)?;

    let segmenter = Segmenter::new(&config.segmenter_config())?;
    let registry = default_registry(config.diff_context_lines);
    let style = ToolPreviewStyle::from(args.style);

    match args.command {
        Command::Stream { file, chunk_size } => {
            let input = read_input(&file).await?;
            let finished = replay_stream(&segmenter, &input, chunk_size.max(1));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&finished)?);
                return Ok(());
            }
            for segment in &finished.segments {
                match segment {
                    Segment::Text { content } => println!("{content}"),
                    Segment::Tool { call } => {
                        println!("[{}]", call.kind);
                        println!("{}", render_tool_call(&registry, call, style));
                    }
                }
            }
        }
        Command::Messages { file } => {
            let input = read_input(&file).await?;
            let messages = parse_messages(&input)?;
            tracing::info!(count = messages.len(), "loaded transcript");
            for message in &messages {
                let calls = extract_tool_calls(message, &segmenter);
                if args.json {
                    for call in &calls {
                        println!("{}", serde_json::to_string(call)?);
                    }
                    continue;
                }
                for call in &calls {
                    println!("[{}] {}", message.message_id, call.kind);
                    println!("{}", render_tool_call(&registry, call, style));
                }
            }
        }
    }

    Ok(())
}

async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("reading stdin")?;
        return Ok(input);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Feeds growing prefixes and prints one JSON line per phase transition.
fn replay_stream(segmenter: &Segmenter, input: &str, chunk_size: usize) -> Segmentation {
    let mut boundaries: Vec<usize> = input
        .char_indices()
        .map(|(index, _)| index)
        .step_by(chunk_size)
        .skip(1)
        .collect();
    boundaries.push(input.len());

    let mut last_phase = StreamPhase::Idle;
    for end in boundaries {
        let live = segmenter.segment(&input[..end]);
        if live.phase != last_phase {
            println!(
                "{}",
                serde_json::json!({
                    "offset": end,
                    "phase": live.phase,
                    "open_tool_name": live.state.open_tool_name,
                    "tool_calls": live.tool_calls().count(),
                })
            );
            last_phase = live.phase;
        }
    }
    segmenter.finish(input)
}

fn parse_messages(input: &str) -> Result<Vec<AgentMessage>> {
    if input.trim_start().starts_with('[') {
        return serde_json::from_str(input).context("parsing transcript array");
    }
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("parsing line {}", index + 1))
        })
        .collect()
}

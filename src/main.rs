//! Batchlog Binary Entry Point
//!
//! Reads JSON-lines log events, pushes them through a sink configured from
//! YAML and logs every generated statement instead of executing it.

use std::path::PathBuf;
use std::time::Duration;

use batchlog::{
    Executor, Level, LogEvent, PropertyValue, SinkBuilder, SinkConfig, StatementLogger,
};
use chrono::{DateTime, FixedOffset};
use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Batchlog - buffered bulk-insert log sink
#[derive(Parser, Debug)]
#[command(name = "batchlog", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/sink.yaml", env = "BATCHLOG_CONFIG")]
    config: PathBuf,

    /// JSON-lines event file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Flush interval (overrides config file), e.g. `500ms`, `2s`
    #[arg(long, value_parser = humantime::parse_duration)]
    period: Option<Duration>,

    /// Log bound parameter values with each statement
    #[arg(long)]
    show_params: bool,
}

/// One input line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputEvent {
    #[serde(default)]
    timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default = "default_level")]
    level: String,
    #[serde(alias = "template")]
    message_template: String,
    #[serde(default)]
    exception: Option<String>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

fn default_level() -> String {
    Level::Information.to_string()
}

impl InputEvent {
    fn into_event(self) -> Result<LogEvent, String> {
        let level: Level = self
            .level
            .parse()
            .map_err(|_| format!("unknown level '{}'", self.level))?;
        let mut event = LogEvent::new(level, self.message_template);
        if let Some(timestamp) = self.timestamp {
            event = event.with_timestamp(timestamp);
        }
        if let Some(exception) = self.exception {
            event = event.with_exception(exception);
        }
        for (name, value) in self.properties {
            event.properties.insert(name, PropertyValue::from(value));
        }
        Ok(event)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,batchlog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = SinkConfig::load(&cli.config)?;

    // CLI > config file
    if let Some(period) = cli.period {
        config.batching = config.batching.with_interval(period);
        config.validate()?;
    }

    let handles = SinkBuilder::new(config)
        .executor(Executor::blocking(StatementLogger {
            show_params: cli.show_params,
        }))
        .build()?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(reader).lines();

    let mut line_no = 0usize;
    let mut skipped = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str::<InputEvent>(&line)
            .map_err(|e| e.to_string())
            .and_then(InputEvent::into_event);
        match event {
            Ok(event) => {
                if let Err(e) = handles.writer.emit(event) {
                    tracing::warn!("Event on line {} not queued: {}", line_no, e);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", line_no, e);
                skipped += 1;
            }
        }
    }

    tracing::info!("Read {} lines ({} skipped), shutting down", line_no, skipped);
    let metrics = handles.shutdown().await?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

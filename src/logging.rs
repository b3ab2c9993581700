//! Logging setup for the binary

use crate::types::SyncError;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Output format for log lines on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Filter directive for a `--log-level` value and `-v` count
///
/// An explicit level wins; otherwise `-v` raises the default `info` to
/// `debug` and `-vv` to `trace`.
pub fn filter_directive(level: Option<&str>, verbosity: u8) -> String {
    let level = match level {
        Some(level) => level,
        None => match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        },
    };
    format!("syncplan={}", level)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` is honoured when neither `--log-level` nor `-v` was given.
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging(level: Option<&str>, verbosity: u8, format: LogFormat) -> Result<(), SyncError> {
    let filter = match (level, verbosity, std::env::var("RUST_LOG")) {
        (None, 0, Ok(from_env)) if !from_env.is_empty() => EnvFilter::try_new(from_env),
        _ => EnvFilter::try_new(filter_directive(level, verbosity)),
    }
    .map_err(|e| SyncError::Config(format!("Invalid log level: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    Ok(())
}

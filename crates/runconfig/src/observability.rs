use std::borrow::Cow;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

const LOG_FORMAT_TEXT: &str = "text";
const LOG_FORMAT_JSON: &str = "json";

#[derive(Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

/// Debug builds log everything down to debug
#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: &str = "debug";

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: &str = "error";

fn detect_log_format(log_format: Option<&str>) -> Result<LogFormat> {
    match log_format {
        None | Some(LOG_FORMAT_TEXT) => Ok(LogFormat::Text),
        Some(LOG_FORMAT_JSON) => Ok(LogFormat::Json),
        Some(unknown) => bail!("unknown log format: {}", unknown),
    }
}

// `--log-level` takes precedence over `--debug`.
fn detect_log_level(input: Option<String>, is_debug: bool) -> Result<Level> {
    let log_level: Cow<str> = match input {
        None if is_debug => "debug".into(),
        None => DEFAULT_LOG_LEVEL.into(),
        Some(level) => level.into(),
    };

    Ok(Level::from_str(log_level.as_ref())?)
}

#[derive(Debug, Default)]
pub struct ObservabilityConfig {
    pub log_debug_flag: bool,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_format: Option<String>,
    pub systemd_log: bool,
}

impl From<&crate::Opts> for ObservabilityConfig {
    fn from(opts: &crate::Opts) -> Self {
        Self {
            log_debug_flag: opts.global.debug,
            log_level: opts.global.log_level.to_owned(),
            log_file: opts.global.log.to_owned(),
            log_format: opts.global.log_format.to_owned(),
            systemd_log: opts.global.systemd_log,
        }
    }
}

pub fn init<T>(config: T) -> Result<()>
where
    T: Into<ObservabilityConfig>,
{
    let config = config.into();
    let level = detect_log_level(config.log_level, config.log_debug_flag)
        .with_context(|| "failed to parse log level")?;
    let log_level_filter = tracing_subscriber::filter::LevelFilter::from(level);
    let log_format = detect_log_format(config.log_format.as_deref())
        .with_context(|| "failed to detect log format")?;

    let systemd_journald = if config.systemd_log {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_syslog_identifier("runconfig".to_string())),
            Err(err) => {
                // No journal socket, e.g. inside a container.
                eprintln!("failed to initialize journald logging: {:?}", err);
                None
            }
        }
    } else {
        None
    };
    let subscriber = tracing_subscriber::registry()
        .with(log_level_filter)
        .with(systemd_journald);

    let to_terminal = config.log_file.is_none();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(to_terminal)
        .with_writer(log_writer(config.log_file.as_deref())?);
    let installed = match log_format {
        LogFormat::Text => subscriber.with(fmt_layer).try_init(),
        LogFormat::Json => subscriber
            .with(fmt_layer.json().flatten_event(true).with_span_list(false))
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to init logger: {}", e))?;

    Ok(())
}

/// Stderr, or the log file opened for appending.
fn log_writer(log_file: Option<&Path>) -> Result<BoxMakeWriter> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Ok(BoxMakeWriter::new(file))
}

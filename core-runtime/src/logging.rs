//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - Pretty, compact and JSON stdout formats
//! - Module-level filtering
//! - A plain-text log file written through a non-blocking appender
//! - Path shortening for log fields
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::LogLevel;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug)
//!     .with_log_file("./upload_log.txt");
//!
//! // Keep the guard alive until exit, otherwise buffered file lines are lost
//! let _guard = init_logging(config)?;
//! tracing::info!("Application started");
//! ```

use crate::error::{Error, Result};
use bridge_traits::LogLevel;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    filter::EnvFilter, fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Crates whose events follow the configured level; everything else is `warn`
const WORKSPACE_CRATES: &[&str] = &[
    "drive_uploader",
    "uploader_cli",
    "core_runtime",
    "core_auth",
    "core_uploader",
    "provider_google_drive",
    "provider_youtube",
    "provider_notion",
    "bridge_desktop",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Single-line format, the CLI default
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Compact
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format for stdout
    pub format: LogFormat,
    /// Minimum log level for workspace crates
    pub level: LogLevel,
    /// Custom filter string (e.g., "provider_youtube=trace,core_uploader=debug")
    pub filter: Option<String>,
    /// Log file appended to in addition to stdout
    pub log_file: Option<PathBuf>,
    /// Emit span enter/exit events (pretty format only)
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            log_file: None,
            enable_spans: false,
            display_target: false,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Also append log lines to `path`
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system
///
/// Call once during startup. Returns the file appender's guard when a log
/// file is configured; dropping it flushes and stops the background writer.
///
/// # Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - The filter string is invalid
/// - The log file's directory cannot be created
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&config)?;

    let (file_writer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    match config.format {
        LogFormat::Pretty => init_pretty_logging(&config, filter, file_writer)?,
        LogFormat::Json => init_json_logging(&config, filter, file_writer)?,
        LogFormat::Compact => init_compact_logging(&config, filter, file_writer)?,
    }

    Ok(guard)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = match &config.filter {
        Some(custom_filter) => custom_filter.clone(),
        None => default_filter_string(config.level),
    };

    EnvFilter::try_new(filter_string).map_err(|e| Error::Logging(format!("Invalid log filter: {}", e)))
}

fn default_filter_string(level: LogLevel) -> String {
    let level = level.as_str();
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        WORKSPACE_CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, level)),
    );
    directives.extend(["h2=warn", "hyper=warn", "reqwest=warn"].map(String::from));
    directives.join(",")
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Logging(format!("Invalid log file path: {}", path.display())))?;

    std::fs::create_dir_all(&directory)?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn init_error(e: impl std::fmt::Display) -> Error {
    Error::Logging(format!("Failed to initialize logging: {}", e))
}

fn file_layer<S>(
    config: &LoggingConfig,
    writer: Option<NonBlocking>,
) -> Option<impl tracing_subscriber::Layer<S>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_target(config.display_target)
            .with_writer(writer)
    })
}

fn init_pretty_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    writer: Option<NonBlocking>,
) -> Result<()> {
    let fmt_layer = fmt::layer()
        .pretty()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(if config.enable_spans {
            FmtSpan::ACTIVE
        } else {
            FmtSpan::NONE
        })
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(file_layer(config, writer))
        .try_init()
        .map_err(init_error)
}

fn init_json_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    writer: Option<NonBlocking>,
) -> Result<()> {
    let fmt_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(config.enable_spans)
        .with_span_list(config.enable_spans)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(file_layer(config, writer))
        .try_init()
        .map_err(init_error)
}

fn init_compact_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    writer: Option<NonBlocking>,
) -> Result<()> {
    let fmt_layer = fmt::layer()
        .compact()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(file_layer(config, writer))
        .try_init()
        .map_err(init_error)
}

/// Strip full file paths to basename only
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::strip_path;
///
/// info!(file = %strip_path("/home/me/temp_videos/clip.mp4"), "Removed scratch copy");
/// // Logs: file="clip.mp4"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}

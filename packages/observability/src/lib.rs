//! # Observability
//!
//! Logging initialization shared by the JMAP client crates.
//!
//! Library crates only ever use `tracing` macros. Binaries call
//! [`init`] or [`init_with_config`] once at startup to decide where the
//! events go and how they are formatted.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "jmap".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod file;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use file::LogFileWriter;

/// Output format for formatted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a format name, defaulting to compact output.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded once at startup.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Format used for every sink.
    pub format: LogFormat,

    /// Optional log file. Events go to stderr when unset.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr when a log file is configured.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            format: LogFormat::Compact,
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Calling this more than once keeps the first subscriber. A log file that
/// cannot be opened falls back to stderr.
pub fn init_with_config(config: LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut file_error = None;

    match config.log_path.as_deref().map(LogFileWriter::open) {
        Some(Ok(writer)) => {
            layers.push(fmt_layer(config.format, writer, false));
            if config.also_stderr {
                layers.push(fmt_layer(config.format, std::io::stderr, true));
            }
        }
        Some(Err(e)) => {
            file_error = Some(e);
            layers.push(fmt_layer(config.format, std::io::stderr, true));
        }
        None => layers.push(fmt_layer(config.format, std::io::stderr, true)),
    }

    if tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .is_err()
    {
        return;
    }

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "Could not open log file, logging to stderr");
    }
    tracing::debug!(service = %config.service_name, "observability initialized");
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    match format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(ansi)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_target(true)
            .json()
            .with_writer(writer)
            .boxed(),
    }
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

//! Logging initialization for the JMAP client binaries.
//!
//! Thin wrapper over the observability package so every binary starts
//! logging the same way.

use observability::{LogConfig, LogFormat};

/// Environment variable selecting the log format (`compact` or `json`).
const ENV_LOG_FORMAT: &str = "JMAP_LOG_FORMAT";

/// Environment variable pointing logs at a file instead of stderr.
const ENV_LOG_FILE: &str = "JMAP_LOG_FILE";

/// Initialize the logging system.
///
/// Log level comes from `RUST_LOG` when set, else from `level`.
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("client started");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service("jmap", level);
}

/// Initialize logging with a custom service name.
pub fn init_logging_for_service(service_name: &str, level: &str) {
    let format = std::env::var(ENV_LOG_FORMAT)
        .map(|raw| LogFormat::parse(&raw))
        .unwrap_or_default();
    let log_path = std::env::var(ENV_LOG_FILE)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(Into::into);

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        format,
        log_path,
        also_stderr: false,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

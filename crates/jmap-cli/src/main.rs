//! `jmap` binary entry point.
//!
//! Usage: jmap [--config <path>] [--log-level <level>] <session|call|watch>
//!
//! Connection settings come from the config file, overridden by the
//! `JMAP_*` environment variables.

mod commands;

use clap::{Parser, Subcommand};
use jmap_config_and_utils::{init_logging, ClientConfig};
use std::path::PathBuf;
use tracing::debug;

/// Command-line JMAP client.
#[derive(Parser, Debug)]
#[command(name = "jmap")]
#[command(about = "Inspect a JMAP session, call methods and watch push notifications")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON configuration file
    #[arg(short, long, env = "JMAP_CONFIG", default_value = "jmap.json", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and print the session
    Session,
    /// Dispatch one method call and print its result
    Call {
        /// Method name, e.g. Mailbox/get
        method: String,
        /// Arguments as a JSON object; a missing accountId is filled in
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Print state changes until interrupted
    Watch {
        /// Entity types to watch (Mailbox, Email, EmailSubmission). Defaults to all.
        types: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ClientConfig::load(&cli.config)?;
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(log_level);
    debug!(config = %cli.config.display(), session_url = %config.session_url, "Configuration loaded");

    match cli.command {
        Commands::Session => commands::session(&config).await,
        Commands::Call { method, args } => commands::call(&config, &method, &args).await,
        Commands::Watch { types } => commands::watch(&config, &types).await,
    }
}

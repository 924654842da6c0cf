//! Configuration, logging setup and shared error types for the JMAP client.

mod config;
mod error;
mod logging;

pub use config::{
    ClientConfig, DEFAULT_LOG_LEVEL, ENV_ACCESS_TOKEN, ENV_API_URL, ENV_LOG_LEVEL, ENV_PUSH_URL,
    ENV_SESSION_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};

//! Client configuration.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the session URL.
pub const ENV_SESSION_URL: &str = "JMAP_SESSION_URL";
/// Environment variable overriding the bearer token.
pub const ENV_ACCESS_TOKEN: &str = "JMAP_ACCESS_TOKEN";
/// Environment variable overriding the API URL advertised by the session.
pub const ENV_API_URL: &str = "JMAP_API_URL";
/// Environment variable overriding the push URL advertised by the session.
pub const ENV_PUSH_URL: &str = "JMAP_PUSH_URL";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "JMAP_LOG_LEVEL";

/// Connection settings for one JMAP account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL of the session resource (e.g. `https://jmap.example.com/jmap/session`).
    #[serde(default)]
    pub session_url: String,
    /// Bearer token sent as `Authorization: Bearer <token>`.
    #[serde(default)]
    pub access_token: Option<String>,
    /// API URL used instead of the one advertised by the session.
    #[serde(default)]
    pub api_url: Option<String>,
    /// WebSocket URL used instead of the one advertised by the session.
    #[serde(default)]
    pub push_url: Option<String>,
    /// Extra headers sent with every HTTP call. They win over the defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_url: String::new(),
            access_token: None,
            api_url: None,
            push_url: None,
            headers: BTreeMap::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at `session_url`.
    pub fn new(session_url: impl Into<String>) -> Self {
        Self {
            session_url: session_url.into(),
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Override the API URL advertised by the session.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Override the push URL advertised by the session.
    pub fn with_push_url(mut self, url: impl Into<String>) -> Self {
        self.push_url = Some(url.into());
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Load configuration from `path` if it exists, falling back to defaults,
    /// then apply environment overrides and validate.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file without environment overrides.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_SESSION_URL) {
            self.session_url = url;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(url) = lookup(ENV_PUSH_URL) {
            self.push_url = Some(url);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// Check that every configured URL parses.
    pub fn validate(&self) -> CoreResult<()> {
        if self.session_url.trim().is_empty() {
            return Err(CoreError::Config("session_url is required".to_string()));
        }
        self.session_url()?;
        for url in [&self.api_url, &self.push_url].into_iter().flatten() {
            Url::parse(url)?;
        }
        Ok(())
    }

    /// Get the session URL as a parsed URL.
    pub fn session_url(&self) -> CoreResult<Url> {
        Url::parse(&self.session_url).map_err(CoreError::from)
    }
}

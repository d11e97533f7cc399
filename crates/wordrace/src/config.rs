//! Server configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use wordrace_room::RoomConfig;

/// A setting that is present but can't be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Everything needed to start a server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// WebSocket listener address.
    pub ws_addr: String,
    /// HTTP listener address.
    pub http_addr: String,
    /// Directory holding the word-list JSON files.
    pub words_dir: PathBuf,
    /// Allowed CORS origins. Empty means any origin.
    pub client_origins: Vec<String>,
    /// How often expired rooms are swept.
    pub sweep_interval: Duration,
    /// Connections silent for this long are closed.
    pub idle_timeout: Duration,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "0.0.0.0:3001".to_string(),
            http_addr: "0.0.0.0:3002".to_string(),
            words_dir: PathBuf::from("assets"),
            client_origins: Vec::new(),
            sweep_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(30 * 60),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `WORDRACE_*` variables, keeping the default for any that are unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if a numeric variable doesn't parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading from `lookup` instead.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = lookup("WORDRACE_WS_ADDR") {
            config.ws_addr = addr;
        }
        if let Some(addr) = lookup("WORDRACE_HTTP_ADDR") {
            config.http_addr = addr;
        }
        if let Some(dir) = lookup("WORDRACE_WORDS_DIR") {
            config.words_dir = PathBuf::from(dir);
        }
        if let Some(origins) = lookup("WORDRACE_CLIENT_ORIGINS") {
            config.client_origins = parse_origins(&origins);
        }
        if let Some(secs) = lookup("WORDRACE_SWEEP_SECS") {
            config.sweep_interval = parse_secs("WORDRACE_SWEEP_SECS", secs)?;
        }
        if let Some(secs) = lookup("WORDRACE_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = parse_secs("WORDRACE_IDLE_TIMEOUT_SECS", secs)?;
        }
        Ok(config)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();
    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

fn parse_secs(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

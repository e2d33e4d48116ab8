//! Process configuration, read once from the environment at startup

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// `None` runs the server with a model stand-in that always fails
    pub openai_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible gateway
    pub gateway: Option<String>,
    pub model: String,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = var("TODO_CHAT_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".todo-chat").join("todo-chat.db")
            },
            PathBuf::from,
        );

        let port = match var("TODO_CHAT_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "TODO_CHAT_PORT",
                value,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match var("TODO_CHAT_REQUEST_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TODO_CHAT_REQUEST_TIMEOUT_SECS",
                        value,
                        expected: "a positive number of seconds",
                    })
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            db_path,
            port,
            openai_api_key: var("OPENAI_API_KEY"),
            gateway: var("LLM_GATEWAY"),
            model: var("TODO_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

//! Environment configuration for the `chat_app` binary.

use std::env;
use std::path::{Path, PathBuf};

use chat_client_mock::MOCK_CLIENT_ID;
use chat_store::{default_store_path, store_root};

pub const CLIENT_ENV_VAR: &str = "CHAT_APP_CLIENT";
pub const STORE_PATH_ENV_VAR: &str = "CHAT_APP_STORE_PATH";
pub const LOG_FILE_ENV_VAR: &str = "CHAT_APP_LOG_FILE";
pub const DEV_ENV_VAR: &str = "CHAT_APP_DEV";
pub const MOCK_PAIRED_ENV_VAR: &str = "CHAT_APP_MOCK_PAIRED";
pub const LOG_FILE_NAME: &str = "chat_app.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required; available clients: {available}")]
    MissingClient {
        var: &'static str,
        available: &'static str,
    },
    #[error("unsupported client '{id}'; available clients: {available}")]
    UnknownClient { id: String, available: &'static str },
    #[error("{var} must be 0 or 1, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
    #[error("failed to resolve the working directory: {source}")]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub client_id: String,
    pub store_path: PathBuf,
    pub log_file: PathBuf,
    /// Post a status notice for every live message.
    pub dev_notices: bool,
    pub mock_paired: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = env::current_dir().map_err(|source| ConfigError::CurrentDir { source })?;
        Self::from_lookup(&cwd, |key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(
        cwd: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let client_id = value(CLIENT_ENV_VAR).ok_or(ConfigError::MissingClient {
            var: CLIENT_ENV_VAR,
            available: MOCK_CLIENT_ID,
        })?;
        if client_id != MOCK_CLIENT_ID {
            return Err(ConfigError::UnknownClient {
                id: client_id,
                available: MOCK_CLIENT_ID,
            });
        }

        Ok(Self {
            client_id,
            store_path: value(STORE_PATH_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| default_store_path(cwd)),
            log_file: value(LOG_FILE_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| store_root(cwd).join(LOG_FILE_NAME)),
            dev_notices: parse_flag(DEV_ENV_VAR, value(DEV_ENV_VAR))?,
            mock_paired: parse_flag(MOCK_PAIRED_ENV_VAR, value(MOCK_PAIRED_ENV_VAR))?,
        })
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref() {
        None | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(ConfigError::InvalidFlag {
            var,
            value: other.to_string(),
        }),
    }
}

//! Environment configuration for the terminal surface.

use std::env;
use std::path::PathBuf;

pub const WRITE_LOG_ENV_VAR: &str = "CHATTERM_WRITE_LOG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Copy of every terminal write, for debugging redraws.
    pub write_log: Option<PathBuf>,
}

impl TerminalConfig {
    pub fn from_env() -> Self {
        Self {
            write_log: env_string_opt(WRITE_LOG_ENV_VAR).map(PathBuf::from),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

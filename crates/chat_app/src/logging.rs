//! Tracing bootstrap.
//!
//! The terminal belongs to the UI, so logs always go to a file through a
//! non-blocking writer. Filter precedence:
//! 1) `RUST_LOG`
//! 2) `CHAT_APP_LOG`
//! 3) internal default filter

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "CHAT_APP_LOG";
pub const DEFAULT_FILTER: &str = "info,chat_app=debug,chat_store=debug";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to configure logger: {0}")]
    Configure(String),
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init(config: &LogConfig) -> Result<WorkerGuard, LoggingError> {
    if let Some(parent) = config
        .file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent).map_err(|source| LoggingError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .map_err(|source| LoggingError::Io {
            path: config.file.clone(),
            source,
        })?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(false)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| LoggingError::Configure(error.to_string()))?;
    Ok(guard)
}

fn filter_from_env() -> EnvFilter {
    let directive = filter_directive(env::var("RUST_LOG").ok(), env::var(LOG_ENV_VAR).ok());
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// First non-blank directive that parses, else [`DEFAULT_FILTER`].
fn filter_directive(rust_log: Option<String>, app_log: Option<String>) -> String {
    [rust_log, app_log]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty() && EnvFilter::try_new(value).is_ok())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

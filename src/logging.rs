//! Structured logging through `tracing`.
//!
//! Console output goes to stderr so it never mixes with command output. When
//! a log file is configured, a second non-blocking layer writes plain-text
//! lines to it; the returned guard must be held until exit to flush them.

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter(&settings.level)?);

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            fs::create_dir_all(dir).map_err(|e| Error::FileSystem {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            let file_name = path.file_name().ok_or_else(|| Error::FileSystem {
                path: path.clone(),
                message: "log file path has no file name".to_string(),
            })?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter(&settings.level)?);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| config_error(format!("logging already initialised: {e}")))?;

    Ok(guard)
}

fn filter(level: &str) -> Result<EnvFilter> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }
    EnvFilter::try_new(level)
        .map_err(|e| config_error(format!("invalid logging.level {level:?}: {e}")))
}

fn config_error(message: String) -> Error {
    Error::Config(::config::ConfigError::Message(message))
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::settings;

/// Keeps the background log writer alive; logs are flushed on drop.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// With a config dir, logs go to `vcomments.log` inside it. Without one they
/// go to stderr at `warn` so they do not drown the output.
pub fn init(config_dir: Option<&Path>, verbose: bool) -> Result<LogGuard> {
    match config_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
            let path = settings::log_path(dir);
            let file_name = path.file_name().context("log path has no file name")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter(if verbose { "debug" } else { "info" }))
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {e}"))?;

            if verbose {
                eprintln!("Logging to {}", path.display());
            }
            Ok(LogGuard {
                _guard: Some(guard),
            })
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(if verbose { "debug" } else { "warn" }))
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {e}"))?;
            Ok(LogGuard { _guard: None })
        }
    }
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

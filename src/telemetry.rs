//! Logging setup
//!
//! Installs a `tracing` subscriber built from [`LoggingConfig`]: stderr
//! output (human readable or JSON) plus an optional daily-rotated file sink.

use crate::config::LoggingConfig;
use crate::error::TraceError;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Prefix of rotated log files
const LOG_FILE_PREFIX: &str = "trace-graph";

/// Log files kept when writing to a directory
const MAX_LOG_FILES: usize = 7;

/// Filter from `RUST_LOG`, falling back to the configured level
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TraceError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| TraceError::Logging(format!("bad level {:?}: {}", config.level, e))),
    }
}

/// Initialize global logging.
///
/// The returned guard flushes the file sink when dropped; hold it for the
/// life of the process. An already installed global subscriber is left in
/// place; the new sinks are dropped and no guard is returned.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, TraceError> {
    let filter = env_filter(config)?;

    let stderr_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| TraceError::io(dir, e))?;
            let appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .max_log_files(MAX_LOG_FILES)
                .build(dir)
                .map_err(|e| TraceError::Logging(e.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .try_init();

    match installed {
        Ok(()) => Ok(guard),
        Err(e) => {
            // The file layer went down with the rejected subscriber.
            warn!(error = %e, "Global subscriber already installed, keeping it");
            Ok(None)
        }
    }
}

//! Subscriber setup for the CLI: stderr console output and an optional
//! per-run log file.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn, Level};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LogConfig;

/// Flushes the log file on drop. Hold it for the life of the process.
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// `-v` and `-vv` override the configured level.
pub fn effective_level(config: &LogConfig, verbosity: u8) -> Level {
    match verbosity {
        0 => config.parse_level(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

struct LogFile {
    path: PathBuf,
    writer: NonBlocking,
    guard: LogGuard,
}

/// Rotates old files away and opens this run's file.
fn open_log_file(config: &LogConfig) -> Result<LogFile> {
    config
        .ensure_log_directory()
        .with_context(|| format!("Failed to create log directory {}", config.log_dir().display()))?;

    let path = config.current_log_path();
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let (writer, worker) = tracing_appender::non_blocking(file);

    Ok(LogFile {
        path,
        writer,
        guard: LogGuard { _worker: worker },
    })
}

/// Installs the global subscriber and reports where settings and logs live.
///
/// `RUST_LOG` directives win over both the config level and `verbosity`.
pub fn init(config: &LogConfig, verbosity: u8, config_path: &Path) -> Result<Option<LogGuard>> {
    let level = effective_level(config, verbosity);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // Cleanup runs before the new file exists so it is never counted.
    let cleanup = config.cleanup_old_logs();
    let log_file = if config.file_output {
        Some(open_log_file(config)?)
    } else {
        None
    };

    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter.clone())
    });

    let (file_layer, log_path, guard) = match log_file {
        Some(LogFile {
            path,
            writer,
            guard,
        }) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            (Some(layer), Some(path), Some(guard))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    debug!("Log level {}", level);
    info!("Using config {}", config_path.display());
    if let Some(path) = log_path {
        info!("Writing log to {}", path.display());
    }
    if let Err(e) = cleanup {
        warn!("Could not remove old log files: {}", e);
    }

    Ok(guard)
}

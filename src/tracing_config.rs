use std::error::Error;

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogFormat, LogLevel};

const DAYS_TO_KEEP: usize = 7;

/// Initialize tracing for the application
///
/// Uses `RUST_LOG` if set, otherwise `level`. Console output goes to stderr
/// so command output on stdout stays clean. With `to_file`, events are also
/// written to a daily rolling file in the log directory; keep the returned
/// guard alive until exit so buffered lines are flushed.
///
/// # Errors
/// Returns error if the log directory cannot be created or a subscriber is
/// already installed
pub fn init(
    level: LogLevel,
    format: LogFormat,
    to_file: bool,
) -> Result<Option<WorkerGuard>, Box<dyn Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let (file_writer, guard) = if to_file {
        let file_appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .max_log_files(DAYS_TO_KEEP)
            .filename_prefix("bluempris")
            .filename_suffix("log")
            .build(ConfigPaths::log_dir()?)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_level(true)
            .with_writer(writer)
            .with_ansi(false)
    });

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_level(true)
                        .with_thread_names(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(guard)
}

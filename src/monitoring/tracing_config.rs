//! Structured logging with tracing
//!
//! Sets up:
//! - Console logging, text or JSON
//! - File logging with daily rotation (optional, always JSON)
//! - Configurable log levels via RUST_LOG

use super::config::{LogFormat, MonitoringConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling::daily};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "docchat.log";

/// Initialize tracing subscriber
///
/// Returns a guard that must be kept alive for the duration of the program.
/// Dropping the guard will stop file logging.
pub fn init_tracing(config: &MonitoringConfig) -> std::io::Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    // Build env filter from RUST_LOG
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console_text = (config.enable_console_logging && config.log_format == LogFormat::Text)
        .then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
        });
    let console_json = (config.enable_console_logging && config.log_format == LogFormat::Json)
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    let (file_layer, guard) = if config.enable_file_logging {
        config.ensure_log_dir()?;
        let file_appender = daily(&config.log_dir, LOG_FILE_PREFIX);
        let (non_blocking_file, guard) = non_blocking(file_appender);
        let layer = fmt::layer()
            .with_writer(non_blocking_file)
            .with_ansi(false) // No ANSI codes in files
            .json();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .try_init();

    Ok(guard)
}

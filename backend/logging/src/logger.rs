//! Structured Logger
//!
//! Wraps `tracing` with a console layer, an optional rolling file layer
//! (NDJSON, one file per day), and `RUST_LOG`-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefix of the daily log files: `kippo.log.YYYY-MM-DD`.
pub const LOG_FILE_NAME: &str = "kippo.log";

/// Initialize the global logger.
///
/// `RUST_LOG` wins over `level` when set. Without `log_dir` only the console
/// layer is installed. Calling this twice is harmless; the first call wins.
pub fn init_logger<P: AsRef<Path>>(log_dir: Option<P>, level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_layer_writes_ndjson() {
        let dir = tempfile::tempdir().unwrap();
        init_logger(Some(dir.path()), "info");
        tracing::info!(organization = "acme", "logger smoke test");

        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(written.iter().any(|name| name.starts_with(LOG_FILE_NAME)));
    }
}

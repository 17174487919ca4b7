use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Daily `qr-gateway.<date>.log` files, keeping the newest `max_files`.
pub fn file_appender(log_dir: &Path, max_files: usize) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("qr-gateway")
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(log_dir)
}

/// Log to stdout and to the rolling file under `log_dir`.
///
/// Both sinks are fed through background writers so a slow disk or
/// terminal never holds up a response. Keep the returned guards alive
/// for the lifetime of the process; dropping them flushes and stops the
/// writers.
pub fn init(log_dir: &Path, max_files: usize) -> Result<[WorkerGuard; 2], InitError> {
    let (file, file_guard) = tracing_appender::non_blocking(file_appender(log_dir, max_files)?);
    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(stdout))
        .with(fmt::layer().with_ansi(false).with_writer(file))
        .init();

    Ok([stdout_guard, file_guard])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_log_dir_is_an_error() {
        let blocker = std::env::temp_dir().join(format!("qr-gateway-logdir-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        assert!(file_appender(&blocker, 7).is_err());

        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn creates_missing_log_dir() {
        let dir = std::env::temp_dir().join(format!("qr-gateway-logs-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        assert!(file_appender(&dir, 7).is_ok());
        assert!(dir.is_dir());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

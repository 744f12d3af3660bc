use chrono::{DateTime, Local};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `<log_dir>/<YYYY-MM-DD HH-MM-SS> - <target dir name> - <operation>.log`
///
/// The target is resolved first so `.` or `..` still yields a directory name.
pub fn run_log_path(
    log_dir: &Path,
    target_dir: Option<&Path>,
    operation: &str,
    now: DateTime<Local>,
) -> PathBuf {
    let target_name = target_dir
        .map(|dir| fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()))
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fileflow".to_string());
    log_dir.join(format!(
        "{} - {} - {}.log",
        now.format("%Y-%m-%d %H-%M-%S"),
        target_name,
        operation
    ))
}

/// Pretty ANSI output on stdout plus a plain copy in `log_file`. `TRACING_LEVEL`
/// sets the filter and `LOG_FILE_PATH` overrides the file.
pub fn init_logger(log_file: &Path) -> impl Drop {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file = env::var("LOG_FILE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| log_file.to_path_buf());
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "fileflow.log".into());

    let file_appender = tracing_appender::rolling::never(&directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!("Logging to {}", log_file.display());

    guard
}

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

pub const LOG_FILE_NAME: &str = "question-input.log";

/// Install a file-backed subscriber under `log_dir`.
///
/// The terminal belongs to the widget while it runs, so nothing is written to stdout/stderr.
/// `RUST_LOG` takes precedence over `default_filter`. Keep the returned guard alive until exit so
/// buffered lines are flushed.
pub fn init(log_dir: &Path, default_filter: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("create log dir {}", log_dir.display()))?;

    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    // Ensure the file is only readable and writable by the current user.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }
    let log_path = log_dir.join(LOG_FILE_NAME);
    let log_file = log_file_opts
        .open(&log_path)
        .with_context(|| format!("open {}", log_path.display()))?;

    let (non_blocking, guard) = non_blocking(log_file);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter
pub const LOG_ENV_VAR: &str = "GOALDO_LOG";
const DEFAULT_FILTER: &str = "goaldo=info";

/// Filter from `GOALDO_LOG`, then the config's `log_filter`, then the default
fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .ok()
        .or_else(|| configured.and_then(|f| EnvFilter::try_new(f).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr, for one-shot CLI commands and the reminder watcher
pub fn init_cli(configured: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to a daily rotated file under `log_dir`, for the TUI which owns the terminal.
/// Keep the returned guard alive for the whole session or buffered lines are lost.
pub fn init_file(log_dir: &Path, configured: Option<&str>) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "goaldo.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured))
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}

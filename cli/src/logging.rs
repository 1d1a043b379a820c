//! File logging so trace output never interleaves with the prompt.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter directives are read from `SCM_LOG`, then `RUST_LOG`.
pub const ENV_LOG: &str = "SCM_LOG";
const LOG_FILE: &str = "scm.log";

/// Install the global subscriber writing to `<log_dir>/scm.log`.
///
/// Returns `None` (and logs nothing) when the directory cannot be created.
/// Keep the guard alive for the whole process so buffered lines are flushed.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "warning: logging disabled, cannot create {}: {err}",
            log_dir.display()
        );
        return None;
    }

    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    if installed.is_err() {
        return None;
    }
    Some(guard)
}

//! Diagnostic logging setup.
//!
//! Standard output belongs to the dashboard or the JSON stream, so tracing
//! diagnostics go to a file through a non-blocking `tracing-appender`
//! writer. The filter defaults to `info` and honours `RUST_LOG`.
//!
//! This is separate from the operator log file written by
//! [`LogSink`](crate::sink::LogSink).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

use crate::sink::TIMESTAMP_FORMAT;

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIMESTAMP_FORMAT))
    }
}

/// Install a global subscriber that appends diagnostics to `path`.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes pending lines. Returns `None` if a global subscriber was already
/// installed.
pub fn init_file_logging(path: &Path) -> Option<WorkerGuard> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name()?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}

//! CLI error type.

use std::io;

use dlmonitor::MonitorError;
use thiserror::Error;

/// Errors that end the CLI with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// Monitor failure the dashboard has already shown.
    #[error(transparent)]
    Reported(MonitorError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to set signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("part worker {0} panicked")]
    WorkerPanicked(usize),
}

impl CliError {
    /// Whether the operator has already seen this error.
    pub fn is_reported(&self) -> bool {
        matches!(self, CliError::Reported(_))
    }
}

//! Error types for the progress monitor.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::part::PartStatusError;

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that end the monitoring loop or fail a reporter call.
///
/// `Render`, `SinkWrite` and `PartStatus` raised while the loop runs end it:
/// the display is restored, the error is reported and the termination
/// callback is invoked. `SinkOpen` and `AlreadyStarted` are returned before
/// the loop starts. `Prompt` only fails the prompt call.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Writing to the terminal or output stream failed.
    #[error("failed to render progress: {0}")]
    Render(#[source] io::Error),

    /// Appending to the configured log file failed.
    #[error("failed to write log file {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening the configured log file failed.
    #[error("failed to open log file {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A part could not report its status.
    #[error("part {index} status unavailable: {source}")]
    PartStatus {
        index: usize,
        #[source]
        source: PartStatusError,
    },

    /// Reading an answer from the operator failed.
    #[error("failed to read prompt input: {0}")]
    Prompt(#[source] io::Error),

    /// The monitor was asked to run twice.
    #[error("monitor already started")]
    AlreadyStarted,
}

impl MonitorError {
    /// Whether the error must stop the surrounding download.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MonitorError::Prompt(_))
    }

    /// Copy of this error for a second receiver. I/O sources keep their
    /// kind and message.
    pub(crate) fn duplicate(&self) -> Self {
        match self {
            MonitorError::Render(e) => MonitorError::Render(copy_io(e)),
            MonitorError::SinkWrite { path, source } => MonitorError::SinkWrite {
                path: path.clone(),
                source: copy_io(source),
            },
            MonitorError::SinkOpen { path, source } => MonitorError::SinkOpen {
                path: path.clone(),
                source: copy_io(source),
            },
            MonitorError::PartStatus { index, source } => MonitorError::PartStatus {
                index: *index,
                source: source.clone(),
            },
            MonitorError::Prompt(e) => MonitorError::Prompt(copy_io(e)),
            MonitorError::AlreadyStarted => MonitorError::AlreadyStarted,
        }
    }
}

fn copy_io(error: &io::Error) -> io::Error {
    io::Error::new(error.kind(), error.to_string())
}

//! Append-only operator log file.
//!
//! One line per durable message:
//!
//! ```text
//! 2024-05-01 12:00:00 MAIN\t[INFO] Starting download
//! ```
//!
//! Every line is flushed immediately so a crash loses at most the line being
//! written.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::channels::Channel;
use crate::error::{MonitorError, MonitorResult};
use crate::types::LogLevel;

/// Timestamp format used at the start of each line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Single-writer append-only log file.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    writer: Box<dyn WriteDebug>,
}

trait WriteDebug: Write + Send + std::fmt::Debug {}
impl<T: Write + Send + std::fmt::Debug> WriteDebug for T {}

impl LogSink {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| MonitorError::SinkOpen {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            writer: Box::new(file),
        })
    }

    /// Wrap an arbitrary writer; `path` is only used in error messages.
    pub fn from_writer<W>(path: impl Into<PathBuf>, writer: W) -> Self
    where
        W: Write + Send + std::fmt::Debug + 'static,
    {
        Self {
            path: path.into(),
            writer: Box::new(writer),
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one message and flush.
    pub fn append(&mut self, channel: Channel, level: LogLevel, message: &str) -> MonitorResult<()> {
        let line = format_line(
            &Local::now().format(TIMESTAMP_FORMAT).to_string(),
            channel,
            level,
            message,
        );
        self.write_line(&line)
            .map_err(|source| MonitorError::SinkWrite {
                path: self.path.clone(),
                source,
            })
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }
}

/// Format one log line including the trailing newline.
pub fn format_line(timestamp: &str, channel: Channel, level: LogLevel, message: &str) -> String {
    format!(
        "{} {}\t[{}] {}\n",
        timestamp,
        channel.log_prefix(),
        level,
        message
    )
}

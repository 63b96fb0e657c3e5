//! Line-delimited JSON output for consuming processes.
//!
//! Every record is one JSON object followed by a newline:
//!
//! ```text
//! {"status":"INITIALIZING"}
//! {"tor":"Connecting..."}
//! {"status":"DOWNLOADING","file":"a.bin","url":"...","size":"100.00 MB",...}
//! {"status":"COMPLETED","duration":"0:01:05","avg_speed":"1.54 MB/s"}
//! ```
//!
//! `INITIALIZING` is always the first record and appears once. After the
//! terminal record (`COMPLETED` or `ERROR`) the stream is closed and further
//! records are dropped.

use std::io::{self, Write};

use serde::Serialize;

use super::{Renderer, Reporter, StructuredReporter};
use crate::channels::{Channel, ChannelMessage};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::format::{format_hms, format_mb, format_mbps};
use crate::types::{DownloadInfo, LogLevel, RunSummary, TickSummary};

/// Value of the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Initializing,
    Downloading,
    Completed,
    Error,
}

/// Progress record emitted every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: Status,
    pub file: String,
    pub url: String,
    pub size: String,
    pub downloaded: String,
    pub percent: String,
    pub avg_speed: String,
    pub curr_speed: String,
    pub remaining: String,
}

impl Report {
    /// Build the progress record for one tick.
    pub fn new(info: &DownloadInfo, tick: &TickSummary) -> Self {
        Self {
            status: Status::Downloading,
            file: info.filename.clone(),
            url: info.url.clone(),
            size: format!("{} MB", format_mb(info.total_size)),
            downloaded: format!("{} MB", format_mb(tick.downloaded)),
            percent: format!("{:.2} %", tick.percent),
            avg_speed: format!("{} MB/s", format_mbps(tick.average_bps)),
            curr_speed: format!("{} MB/s", format_mbps(tick.current_bps)),
            remaining: format_hms(tick.remaining),
        }
    }
}

#[derive(Serialize)]
struct StatusRecord {
    status: Status,
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    status: Status,
    message: &'a str,
}

#[derive(Serialize)]
struct CompletedRecord {
    status: Status,
    duration: String,
    avg_speed: String,
}

#[derive(Serialize)]
enum LogRecord<'a> {
    #[serde(rename = "tor")]
    Network(&'a str),
    #[serde(rename = "captcha")]
    Solver(&'a str),
}

#[derive(Serialize)]
struct MainErrorRecord<'a> {
    main: &'a str,
    level: LogLevel,
}

/// Writes one JSON object per line to the output stream.
#[derive(Debug)]
pub struct StructuredRenderer<W: Write + Send> {
    out: W,
    started: bool,
    closed: bool,
}

impl<W: Write + Send> StructuredRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
            closed: false,
        }
    }

    /// Underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Whether the terminal record has been written.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_started(&mut self) -> io::Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.write_raw(&StatusRecord {
            status: Status::Initializing,
        })
    }

    fn emit<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        if self.closed {
            tracing::debug!("Dropping record written after the terminal record");
            return Ok(());
        }
        self.ensure_started()?;
        self.write_raw(record)
    }

    fn emit_terminal<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        self.emit(record)?;
        self.closed = true;
        Ok(())
    }

    fn write_raw<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write + Send> Renderer for StructuredRenderer<W> {
    fn log(
        &mut self,
        channel: Channel,
        message: &ChannelMessage,
        _progress: bool,
    ) -> io::Result<()> {
        match channel {
            Channel::Network => self.emit(&LogRecord::Network(&message.text)),
            Channel::Solver => self.emit(&LogRecord::Solver(&message.text)),
            Channel::Main if message.level == LogLevel::Error => self.emit(&MainErrorRecord {
                main: &message.text,
                level: message.level,
            }),
            Channel::Main => Ok(()),
        }
    }

    // The prompt text would corrupt the stream, so nothing is written.
    fn prompt(&mut self, _message: &str, _level: LogLevel) -> io::Result<()> {
        Ok(())
    }

    fn start(&mut self, _info: &DownloadInfo) -> io::Result<()> {
        self.ensure_started()
    }

    fn render_tick(&mut self, info: &DownloadInfo, tick: &TickSummary) -> io::Result<()> {
        self.emit(&Report::new(info, tick))
    }

    fn finish(&mut self, _info: &DownloadInfo, summary: &RunSummary) -> io::Result<()> {
        self.emit_terminal(&CompletedRecord {
            status: Status::Completed,
            duration: format_hms(summary.elapsed),
            avg_speed: format!("{} MB/s", format_mbps(summary.average_bps)),
        })
    }

    fn fail(&mut self, _info: &DownloadInfo, error: &MonitorError) -> io::Result<()> {
        let message = error.to_string();
        self.emit_terminal(&ErrorRecord {
            status: Status::Error,
            message: &message,
        })
    }
}

impl<W: Write + Send> StructuredReporter<W> {
    /// Structured reporter writing to `out`.
    pub fn with_writer(out: W, config: MonitorConfig) -> MonitorResult<Self> {
        Reporter::new(StructuredRenderer::new(out), config)
    }
}

impl StructuredReporter {
    /// Structured reporter writing to standard output.
    pub fn stdout(config: MonitorConfig) -> MonitorResult<Self> {
        Self::with_writer(io::stdout(), config)
    }
}

//! Core data types shared by the monitor and its renderers.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::channels::ChannelMessage;

/// Severity of a status line or log message.
///
/// Ordered so that `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Tag used in the log file (`[INFO]`, `[WARNING]`, `[ERROR]`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of the download job being monitored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    /// Output file name.
    pub filename: String,
    /// Source URL.
    pub url: String,
    /// Download type label (e.g. "fast", "slow", "direct").
    pub download_type: String,
    /// Total size in bytes.
    pub total_size: u64,
    /// Size of one part in bytes.
    pub part_size: u64,
    /// Number of parts.
    pub parts: usize,
}

impl DownloadInfo {
    /// Create a descriptor, deriving the part size from the total and part count.
    pub fn new(
        filename: impl Into<String>,
        url: impl Into<String>,
        download_type: impl Into<String>,
        total_size: u64,
        parts: usize,
    ) -> Self {
        let part_size = if parts == 0 {
            0
        } else {
            total_size.div_ceil(parts as u64)
        };

        Self {
            filename: filename.into(),
            url: url.into(),
            download_type: download_type.into(),
            total_size,
            part_size,
            parts,
        }
    }
}

/// Point-in-time status of one download part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartStatus {
    /// Human-readable status line shown next to the part.
    pub display_line: String,
    /// Severity of the status line.
    pub level: LogLevel,
    /// Bytes downloaded so far by this part.
    pub bytes_downloaded: u64,
}

impl PartStatus {
    pub fn new(display_line: impl Into<String>, level: LogLevel, bytes_downloaded: u64) -> Self {
        Self {
            display_line: display_line.into(),
            level,
            bytes_downloaded,
        }
    }
}

/// Last known CAPTCHA solver statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptchaStats {
    /// Total solve attempts.
    pub all: u64,
    /// Successful solves.
    pub ok: u64,
    /// Wrongly solved CAPTCHAs.
    pub bad: u64,
    /// Attempts rejected by rate limiting.
    pub lim: u64,
    /// Attempts blocked by the remote side.
    pub block: u64,
    /// Network errors.
    pub net: u64,
}

/// Aggregate produced by one monitor tick and handed to the active renderer.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// Sum of bytes downloaded across all parts.
    pub downloaded: u64,
    /// Total size of the download.
    pub total_size: u64,
    /// `downloaded / total_size * 100`, or 0 for an empty download.
    pub percent: f64,
    /// Average rate since monitoring started (bytes/second).
    pub average_bps: f64,
    /// Rate over the sliding window (bytes/second).
    pub current_bps: f64,
    /// Estimated time until completion at the average rate.
    pub remaining: Duration,
    /// Per-part snapshots in part index order.
    pub parts: Vec<PartStatus>,
    /// Most recent network or solver message.
    pub link_message: ChannelMessage,
    /// Most recent main-channel message.
    pub main_message: ChannelMessage,
    /// Latest solver statistics, if the solver has reported.
    pub captcha_stats: Option<CaptchaStats>,
}

/// Final statistics emitted once when the monitor loop stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Bytes downloaded while the monitor was running.
    pub downloaded: u64,
    /// Bytes that were already present when monitoring started.
    pub start_bytes: u64,
    /// Total size of the download.
    pub total_size: u64,
    /// Wall time since monitoring started.
    pub elapsed: Duration,
    /// `downloaded / elapsed` in bytes/second, or 0 for zero elapsed time.
    pub average_bps: f64,
}

impl RunSummary {
    /// Whether the run continued a partially downloaded file.
    pub fn is_resumed(&self) -> bool {
        self.start_bytes > 0
    }
}

//! Monitor configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::throughput::DEFAULT_WINDOW_CAPACITY;

/// Default interval between monitor ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Default first terminal row (0-based) of the dashboard's dynamic region.
///
/// Rows above it hold the static header written once at startup.
pub const DEFAULT_STATUS_START_ROW: u16 = 5;

/// Configuration shared by both reporter variants.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Time between ticks.
    pub tick_interval: Duration,

    /// Samples kept for the current-rate window.
    pub window_capacity: usize,

    /// Show one line per part on the dashboard.
    pub show_parts: bool,

    /// First row of the dashboard's dynamic region.
    pub status_start_row: u16,

    /// Optional operator log file.
    pub log_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            show_parts: false,
            status_start_row: DEFAULT_STATUS_START_ROW,
            log_file: None,
        }
    }
}

impl MonitorConfig {
    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the throughput window capacity.
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    /// Enable or disable per-part lines.
    pub fn with_show_parts(mut self, show_parts: bool) -> Self {
        self.show_parts = show_parts;
        self
    }

    /// Set the first dashboard row.
    pub fn with_status_start_row(mut self, row: u16) -> Self {
        self.status_start_row = row;
        self
    }

    /// Append durable messages to `path`.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

//! Status contract between download parts and the monitor.
//!
//! The monitor only ever reads part status. Each part exposes a
//! [`PartStatusSource`] that returns a consistent point-in-time
//! [`PartStatus`] without blocking on the worker.
//!
//! [`SharedPartStatus`] is a ready-made implementation for workers that run
//! on their own threads: the byte counter is a lock-free atomic, and the
//! display line sits behind a short-lived mutex so a read never observes a
//! torn line.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::types::{LogLevel, PartStatus};

/// Failure reported by a part when its status cannot be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct PartStatusError {
    reason: String,
}

impl PartStatusError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Read access to the live status of one download part.
///
/// Implementations must return quickly and must not block on the worker
/// that owns the part.
pub trait PartStatusSource: Send + Sync {
    /// Current display line, severity and bytes downloaded.
    fn status(&self) -> Result<PartStatus, PartStatusError>;
}

/// Thread-safe part status updated by a worker and read by the monitor.
#[derive(Debug, Default)]
pub struct SharedPartStatus {
    bytes: AtomicU64,
    line: Mutex<(String, LogLevel)>,
}

impl SharedPartStatus {
    /// Create a status with zero bytes and an empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a status for a part that already holds `bytes` (resumed download).
    pub fn with_bytes(bytes: u64) -> Self {
        Self {
            bytes: AtomicU64::new(bytes),
            line: Mutex::new((String::new(), LogLevel::Info)),
        }
    }

    /// Add freshly downloaded bytes.
    pub fn add_bytes(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    /// Overwrite the byte counter.
    pub fn set_bytes(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::SeqCst);
    }

    /// Current byte counter.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    /// Replace the display line.
    pub fn set_line(&self, line: impl Into<String>, level: LogLevel) {
        *self.line.lock() = (line.into(), level);
    }
}

impl PartStatusSource for SharedPartStatus {
    fn status(&self) -> Result<PartStatus, PartStatusError> {
        let (line, level) = self.line.lock().clone();
        Ok(PartStatus::new(line, level, self.bytes()))
    }
}

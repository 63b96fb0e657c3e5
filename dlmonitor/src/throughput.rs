//! Sliding-window throughput estimation.
//!
//! Tracks two rates for an aggregate byte counter:
//!
//! - **average**: bytes gained since monitoring started, divided by the time
//!   since start.
//! - **current**: bytes gained since the oldest sample in a bounded FIFO
//!   window, divided by the age of that sample. With a 500ms tick and a
//!   window of 10 this follows roughly the last five seconds.
//!
//! Zero elapsed time is not an error: the corresponding rate is 0.

use std::collections::VecDeque;
use std::time::Instant;

/// Default number of samples kept in the window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// One (bytes, time) observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputSample {
    /// Aggregate byte count at the time of the sample.
    pub bytes: u64,
    /// When the sample was taken.
    pub timestamp: Instant,
}

/// Average and short-term transfer rate estimator.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use dlmonitor::ThroughputEstimator;
///
/// let start = Instant::now();
/// let mut estimator = ThroughputEstimator::new(0, start);
///
/// let (average, current) = estimator.update(1_000, start + Duration::from_secs(1));
/// assert_eq!(average, 1_000.0);
/// assert_eq!(current, 1_000.0);
/// ```
#[derive(Debug, Clone)]
pub struct ThroughputEstimator {
    start: ThroughputSample,
    samples: VecDeque<ThroughputSample>,
    capacity: usize,
}

impl ThroughputEstimator {
    /// Create an estimator whose baseline is `start_bytes` at `start_time`.
    pub fn new(start_bytes: u64, start_time: Instant) -> Self {
        Self::with_capacity(start_bytes, start_time, DEFAULT_WINDOW_CAPACITY)
    }

    /// Create an estimator with an explicit window capacity (minimum 1).
    pub fn with_capacity(start_bytes: u64, start_time: Instant, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let start = ThroughputSample {
            bytes: start_bytes,
            timestamp: start_time,
        };

        let mut samples = VecDeque::with_capacity(capacity);
        samples.push_back(start);

        Self {
            start,
            samples,
            capacity,
        }
    }

    /// Record the aggregate byte count at `now` and return
    /// `(average_bps, current_bps)`.
    ///
    /// Rates are computed against the state before this sample is added.
    pub fn update(&mut self, current_bytes: u64, now: Instant) -> (f64, f64) {
        let average = rate(&self.start, current_bytes, now);
        let current = self
            .samples
            .front()
            .map(|oldest| rate(oldest, current_bytes, now))
            .unwrap_or(0.0);

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ThroughputSample {
            bytes: current_bytes,
            timestamp: now,
        });

        (average, current)
    }

    /// Baseline sample taken when monitoring started.
    pub fn start(&self) -> ThroughputSample {
        self.start
    }

    /// Oldest sample in the window (baseline for the next current rate).
    pub fn oldest(&self) -> Option<ThroughputSample> {
        self.samples.front().copied()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window is empty. Never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn rate(baseline: &ThroughputSample, current_bytes: u64, now: Instant) -> f64 {
    let elapsed = now.saturating_duration_since(baseline.timestamp).as_secs_f64();
    if elapsed <= 0.0 {
        return 0.0;
    }
    current_bytes.saturating_sub(baseline.bytes) as f64 / elapsed
}

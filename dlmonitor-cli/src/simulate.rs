//! Simulated download parts.
//!
//! Each part runs on its own thread and advances a [`SharedPartStatus`] at a
//! fixed rate, the way a real downloader's part workers would. Part 0 also
//! drives the network and solver channels so every dashboard row has
//! something to show. When the last part finishes, the stop token is
//! cancelled and the monitor loop winds down.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dlmonitor::{
    CaptchaStats, Frontend, LogLevel, MonitorResult, PartStatusSource, SharedPartStatus,
};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// Time between progress steps of a worker.
pub const DEFAULT_STEP: Duration = Duration::from_millis(100);

/// Bytes each of `parts` parts must fetch; the last part takes the remainder.
pub fn part_lengths(total: u64, parts: usize) -> Vec<u64> {
    if parts == 0 {
        return Vec::new();
    }
    let size = total.div_ceil(parts as u64);
    let mut left = total;
    (0..parts)
        .map(|_| {
            let len = size.min(left);
            left -= len;
            len
        })
        .collect()
}

/// A set of simulated parts and their worker settings.
pub struct Simulation {
    parts: Vec<Arc<SharedPartStatus>>,
    lengths: Vec<u64>,
    bytes_per_step: u64,
    step: Duration,
}

impl Simulation {
    /// Split `total` bytes over `parts` parts, each advancing at `rate_bps`.
    pub fn new(total: u64, parts: usize, rate_bps: f64) -> Result<Self, CliError> {
        if parts == 0 {
            return Err(CliError::InvalidArgument(
                "at least one part is required".to_string(),
            ));
        }
        if !rate_bps.is_finite() || rate_bps <= 0.0 {
            return Err(CliError::InvalidArgument(format!(
                "rate must be positive, got {}",
                rate_bps
            )));
        }

        let step = DEFAULT_STEP;
        let bytes_per_step = ((rate_bps * step.as_secs_f64()) as u64).max(1);

        Ok(Self {
            parts: (0..parts).map(|_| Arc::new(SharedPartStatus::new())).collect(),
            lengths: part_lengths(total, parts),
            bytes_per_step,
            step,
        })
    }

    /// Override the time between progress steps.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Status handles for the monitor.
    pub fn sources(&self) -> Vec<Arc<dyn PartStatusSource>> {
        self.parts
            .iter()
            .map(|part| Arc::clone(part) as Arc<dyn PartStatusSource>)
            .collect()
    }

    /// Start one thread per part.
    ///
    /// Workers exit early once `shutdown` is set. The last worker to finish
    /// cancels `stop`.
    pub fn spawn(
        &self,
        frontend: Arc<dyn Frontend>,
        stop: CancellationToken,
        shutdown: Arc<AtomicBool>,
    ) -> Vec<JoinHandle<()>> {
        let running = Arc::new(AtomicUsize::new(self.parts.len()));

        self.parts
            .iter()
            .zip(&self.lengths)
            .enumerate()
            .map(|(index, (part, &length))| {
                let worker = Worker {
                    index,
                    part: Arc::clone(part),
                    length,
                    bytes_per_step: self.bytes_per_step,
                    step: self.step,
                    frontend: Arc::clone(&frontend),
                    shutdown: Arc::clone(&shutdown),
                };
                let running = Arc::clone(&running);
                let stop = stop.clone();

                thread::spawn(move || {
                    worker.run();
                    if running.fetch_sub(1, Ordering::SeqCst) == 1 {
                        stop.cancel();
                    }
                })
            })
            .collect()
    }
}

/// Wait for every worker thread.
pub fn join_all(handles: Vec<JoinHandle<()>>) -> Result<(), CliError> {
    for (index, handle) in handles.into_iter().enumerate() {
        handle
            .join()
            .map_err(|_| CliError::WorkerPanicked(index))?;
    }
    Ok(())
}

struct Worker {
    index: usize,
    part: Arc<SharedPartStatus>,
    length: u64,
    bytes_per_step: u64,
    step: Duration,
    frontend: Arc<dyn Frontend>,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    fn run(&self) {
        if self.index == 0 {
            self.solve_link();
        }

        self.part.set_line("Downloading", LogLevel::Info);
        while !self.shutdown.load(Ordering::SeqCst) {
            let done = self.part.bytes();
            if done >= self.length {
                break;
            }
            self.part.add_bytes(self.bytes_per_step.min(self.length - done));
            thread::sleep(self.step);
        }

        if self.part.bytes() >= self.length {
            self.part.set_line("Done", LogLevel::Info);
            self.log_main(&format!("Part {} finished", self.index), LogLevel::Info);
        } else {
            self.part.set_line("Stopped", LogLevel::Warning);
        }
    }

    // Walk the network and solver channels through a typical link solve.
    fn solve_link(&self) {
        let steps = [
            ("Connecting to TOR network", LogLevel::Info),
            ("Circuit established", LogLevel::Info),
        ];
        for (message, level) in steps {
            self.check(self.frontend.log_network(message, level, false));
        }

        let mut stats = CaptchaStats::default();
        for attempt in 1..=3u64 {
            stats.all = attempt;
            let message = format!("Solving CAPTCHA, attempt {}", attempt);
            self.check(self.frontend.log_solver(&message, LogLevel::Info, true));
            if attempt < 3 {
                stats.bad += 1;
            } else {
                stats.ok += 1;
            }
            self.frontend.update_solver_stats(stats);
        }

        self.check(
            self.frontend
                .log_solver("Download link resolved", LogLevel::Info, false),
        );
    }

    fn log_main(&self, message: &str, level: LogLevel) {
        self.check(self.frontend.log_main(message, level, false));
    }

    // A fatal log failure stops every worker; anything else is only traced.
    fn check(&self, result: MonitorResult<()>) {
        let Err(e) = result else {
            return;
        };
        if e.is_fatal() {
            tracing::error!(error = %e, part = self.index, "Fatal log failure, stopping workers");
            self.shutdown.store(true, Ordering::SeqCst);
        } else {
            tracing::warn!(error = %e, part = self.index, "Failed to log message");
        }
    }
}

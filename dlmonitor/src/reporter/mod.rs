//! Reporters: the capability set handed to the rest of a downloader.
//!
//! A [`Reporter`] owns everything the monitor needs between ticks: the last
//! message per log channel, the last solver statistics, the optional log
//! file, and a [`Renderer`] that decides what the operator sees.
//!
//! Two renderers exist, selected at construction:
//!
//! - [`InteractiveRenderer`]: ANSI dashboard redrawn in place.
//! - [`StructuredRenderer`]: one JSON record per line on standard output.
//!
//! # State Machine
//!
//! ```text
//! NotStarted --run()--> Running --stop signal--> Stopped
//!                          |
//!                          +--snapshot/render/sink error--> Failed
//! ```
//!
//! # Thread Safety
//!
//! Log calls arrive from worker threads while the loop runs. All mutable
//! state sits behind one `parking_lot::Mutex`, locked for the duration of a
//! single log call or a single render and never across an `.await`.

mod interactive;
mod monitor;
mod structured;

use std::io::{self, BufRead};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::channels::{Channel, ChannelMessage, LogChannelState};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::part::PartStatusSource;
use crate::sink::LogSink;
use crate::types::{CaptchaStats, DownloadInfo, LogLevel, RunSummary, TickSummary};

pub use interactive::{InteractiveRenderer, Palette};
pub use structured::{Report, Status, StructuredRenderer};

/// Callback invoked once when the monitor fails, expected to stop the whole job.
pub type TerminateFn = Box<dyn FnOnce() + Send>;

/// Reporter with the interactive dashboard renderer.
pub type InteractiveReporter<T = crate::terminal::AnsiTerminal<io::Stdout>> =
    Reporter<InteractiveRenderer<T>>;

/// Reporter with the line-delimited JSON renderer.
pub type StructuredReporter<W = io::Stdout> = Reporter<StructuredRenderer<W>>;

/// Operations a downloader uses to report progress and talk to the operator.
///
/// A fatal error from a log call is returned to the caller and also ends a
/// running monitor loop on its next tick.
pub trait Frontend: Send + Sync {
    /// Whether [`Frontend::prompt`] can ask the operator for input.
    fn supports_prompt(&self) -> bool;

    /// Record a network-layer (TOR) message.
    fn log_network(&self, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()>;

    /// Record a CAPTCHA solver message.
    fn log_solver(&self, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()>;

    /// Record a main-flow message.
    fn log_main(&self, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()>;

    /// Replace the solver statistics.
    fn update_solver_stats(&self, stats: CaptchaStats);

    /// Ask the operator for one line of input and return it trimmed.
    ///
    /// Blocks the calling thread until a line is available.
    fn prompt(&self, message: &str, level: LogLevel) -> MonitorResult<String>;

    /// Run the monitoring loop until `stop` is cancelled or an error occurs.
    ///
    /// On error the display is restored, the error is reported, `terminate`
    /// is called once, and the error is returned.
    fn run<'a>(
        &'a self,
        info: &'a DownloadInfo,
        parts: &'a [Arc<dyn PartStatusSource>],
        stop: CancellationToken,
        terminate: TerminateFn,
    ) -> BoxFuture<'a, MonitorResult<RunSummary>>;
}

/// Presentation backend driven by a [`Reporter`].
pub trait Renderer: Send {
    /// A log message arrived on `channel`.
    fn log(&mut self, channel: Channel, message: &ChannelMessage, progress: bool)
        -> io::Result<()>;

    /// Show `message` before reading a line of operator input.
    fn prompt(&mut self, message: &str, level: LogLevel) -> io::Result<()>;

    /// The monitoring loop is starting.
    fn start(&mut self, info: &DownloadInfo) -> io::Result<()>;

    /// Render one tick.
    fn render_tick(&mut self, info: &DownloadInfo, tick: &TickSummary) -> io::Result<()>;

    /// The loop stopped normally; restore the display and show the summary.
    fn finish(&mut self, info: &DownloadInfo, summary: &RunSummary) -> io::Result<()>;

    /// The loop failed; restore the display and show the error.
    fn fail(&mut self, info: &DownloadInfo, error: &MonitorError) -> io::Result<()>;
}

/// Lifecycle of a reporter's monitoring loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    NotStarted,
    Running,
    Stopped,
    Failed,
}

struct Inner<R> {
    channels: LogChannelState,
    solver_stats: Option<CaptchaStats>,
    renderer: R,
    state: MonitorState,
    /// First fatal error raised by a log call, picked up by the next tick.
    pending_error: Option<MonitorError>,
}

/// Progress reporter generic over its [`Renderer`].
pub struct Reporter<R: Renderer> {
    config: MonitorConfig,
    inner: Mutex<Inner<R>>,
    input: Mutex<Box<dyn BufRead + Send>>,
}

impl<R: Renderer> Reporter<R> {
    /// Create a reporter, opening the log file named in `config` if any.
    ///
    /// Prompt input is read from standard input.
    pub fn new(renderer: R, config: MonitorConfig) -> MonitorResult<Self> {
        let channels = match &config.log_file {
            Some(path) => LogChannelState::with_sink(LogSink::open(path)?),
            None => LogChannelState::new(),
        };

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                channels,
                solver_stats: None,
                renderer,
                state: MonitorState::NotStarted,
                pending_error: None,
            }),
            input: Mutex::new(Box::new(io::BufReader::new(io::stdin()))),
        })
    }

    /// Read prompt answers from `input` instead of standard input.
    pub fn with_input(self, input: impl BufRead + Send + 'static) -> Self {
        *self.input.lock() = Box::new(input);
        self
    }

    /// Append durable messages to `sink`, replacing any configured log file.
    pub fn with_log_sink(self, sink: LogSink) -> Self {
        self.inner.lock().channels = LogChannelState::with_sink(sink);
        self
    }

    /// Configuration this reporter was built with.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.inner.lock().state
    }

    /// Newest message on `channel`.
    pub fn latest(&self, channel: Channel) -> ChannelMessage {
        self.inner.lock().channels.latest(channel).clone()
    }

    /// Last reported solver statistics.
    pub fn solver_stats(&self) -> Option<CaptchaStats> {
        self.inner.lock().solver_stats
    }

    /// Run `f` with shared access to the renderer.
    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.inner.lock().renderer)
    }

    fn log(&self, channel: Channel, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()> {
        tracing::trace!(channel = %channel, level = %level, progress, message);

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let recorded = inner.channels.record(channel, message, level, progress);
        let rendered = inner
            .renderer
            .log(channel, &ChannelMessage::new(message, level), progress)
            .map_err(MonitorError::Render);

        let result = recorded.and(rendered);
        if let Err(error) = &result {
            if error.is_fatal() && inner.pending_error.is_none() {
                tracing::error!(channel = %channel, error = %error, "Log call failed, stopping monitor");
                inner.pending_error = Some(error.duplicate());
            }
        }
        result
    }
}

impl<R: Renderer> Frontend for Reporter<R> {
    fn supports_prompt(&self) -> bool {
        true
    }

    fn log_network(&self, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()> {
        self.log(Channel::Network, message, level, progress)
    }

    fn log_solver(&self, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()> {
        self.log(Channel::Solver, message, level, progress)
    }

    fn log_main(&self, message: &str, level: LogLevel, progress: bool) -> MonitorResult<()> {
        self.log(Channel::Main, message, level, progress)
    }

    fn update_solver_stats(&self, stats: CaptchaStats) {
        self.inner.lock().solver_stats = Some(stats);
    }

    fn prompt(&self, message: &str, level: LogLevel) -> MonitorResult<String> {
        self.inner
            .lock()
            .renderer
            .prompt(message, level)
            .map_err(MonitorError::Render)?;

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .read_line(&mut line)
            .map_err(MonitorError::Prompt)?;
        if read == 0 {
            return Err(MonitorError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            )));
        }

        Ok(line.trim().to_string())
    }

    fn run<'a>(
        &'a self,
        info: &'a DownloadInfo,
        parts: &'a [Arc<dyn PartStatusSource>],
        stop: CancellationToken,
        terminate: TerminateFn,
    ) -> BoxFuture<'a, MonitorResult<RunSummary>> {
        Box::pin(self.run_monitor(info, parts, stop, terminate))
    }
}

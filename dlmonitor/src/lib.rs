//! dlmonitor - Live progress monitoring for multi-part downloads
//!
//! This library watches a set of independently progressing download parts,
//! turns their byte counters into throughput statistics, and reports the
//! result either as an interactive terminal dashboard or as a stream of
//! newline-delimited JSON records.
//!
//! # Architecture
//!
//! ```text
//! Part workers ───► PartStatusSource ───► Monitor loop ───► Renderer
//!                   (atomic point read)   (tick, estimate)   (ANSI / JSON)
//!                                              ▲
//! Network / solver / main logs ───► LogChannelState + LogSink
//! ```
//!
//! The [`Frontend`] trait is the capability set handed to the rest of a
//! downloader: three log channels, solver statistics, an operator prompt and
//! the monitoring loop itself. Two variants implement it:
//! [`InteractiveReporter`] and [`StructuredReporter`].

pub mod channels;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod part;
pub mod reporter;
pub mod sink;
pub mod terminal;
pub mod throughput;
pub mod types;

pub use channels::{Channel, ChannelMessage, LogChannelState};
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use part::{PartStatusError, PartStatusSource, SharedPartStatus};
pub use reporter::{
    Frontend, InteractiveRenderer, InteractiveReporter, MonitorState, Palette, Renderer, Report,
    Reporter, Status, StructuredRenderer, StructuredReporter, TerminateFn,
};
pub use sink::LogSink;
pub use terminal::{AnsiTerminal, Terminal};
pub use throughput::{ThroughputEstimator, ThroughputSample};
pub use types::{CaptchaStats, DownloadInfo, LogLevel, PartStatus, RunSummary, TickSummary};

/// Version of the dlmonitor library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

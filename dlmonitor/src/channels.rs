//! Last-value state for the three log channels.
//!
//! Three producers write log messages while a download runs: the network
//! (TOR) layer, the CAPTCHA solver and the main control flow. The dashboard
//! only ever shows the newest message per channel, so no history is kept.
//! Durable messages are also appended to the optional [`LogSink`].

use std::fmt;

use crate::error::MonitorResult;
use crate::sink::LogSink;
use crate::types::LogLevel;

/// Source of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Network / anonymization layer (TOR).
    Network,
    /// CAPTCHA solver.
    Solver,
    /// Main control flow.
    Main,
}

impl Channel {
    /// Prefix written before the tab in log file lines.
    pub fn log_prefix(&self) -> &'static str {
        match self {
            Channel::Network => "TOR ",
            Channel::Solver => "CAPTCHA",
            Channel::Main => "MAIN",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.log_prefix().trim_end())
    }
}

/// A message and its severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMessage {
    pub text: String,
    pub level: LogLevel,
}

impl ChannelMessage {
    pub fn new(text: impl Into<String>, level: LogLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

/// Newest message per channel plus the optional durable log.
#[derive(Debug, Default)]
pub struct LogChannelState {
    network: ChannelMessage,
    solver: ChannelMessage,
    main: ChannelMessage,
    last_link: Option<Channel>,
    sink: Option<LogSink>,
}

impl LogChannelState {
    /// Create state without a log file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state that appends durable messages to `sink`.
    pub fn with_sink(sink: LogSink) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    /// Record a network-layer message.
    pub fn record_network_log(
        &mut self,
        text: &str,
        level: LogLevel,
        progress: bool,
    ) -> MonitorResult<()> {
        self.record(Channel::Network, text, level, progress)
    }

    /// Record a solver message.
    pub fn record_solver_log(
        &mut self,
        text: &str,
        level: LogLevel,
        progress: bool,
    ) -> MonitorResult<()> {
        self.record(Channel::Solver, text, level, progress)
    }

    /// Record a main-flow message.
    pub fn record_main_log(
        &mut self,
        text: &str,
        level: LogLevel,
        progress: bool,
    ) -> MonitorResult<()> {
        self.record(Channel::Main, text, level, progress)
    }

    /// Record a message on `channel`.
    ///
    /// The in-memory value is replaced before the sink is written, so a sink
    /// failure still leaves the newest message visible.
    pub fn record(
        &mut self,
        channel: Channel,
        text: &str,
        level: LogLevel,
        progress: bool,
    ) -> MonitorResult<()> {
        let message = ChannelMessage::new(text, level);
        match channel {
            Channel::Network => {
                self.network = message;
                self.last_link = Some(channel);
            }
            Channel::Solver => {
                self.solver = message;
                self.last_link = Some(channel);
            }
            Channel::Main => self.main = message,
        }

        if progress {
            return Ok(());
        }
        match self.sink.as_mut() {
            Some(sink) => sink.append(channel, level, text),
            None => Ok(()),
        }
    }

    /// Newest message on `channel`.
    pub fn latest(&self, channel: Channel) -> &ChannelMessage {
        match channel {
            Channel::Network => &self.network,
            Channel::Solver => &self.solver,
            Channel::Main => &self.main,
        }
    }

    /// Newest message from either the network or the solver channel.
    ///
    /// Both share one dashboard line.
    pub fn latest_link_message(&self) -> &ChannelMessage {
        match self.last_link {
            Some(Channel::Network) => &self.network,
            _ => &self.solver,
        }
    }

    /// Whether a log file is configured.
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }
}

//! Interactive terminal dashboard.
//!
//! Layout once the loop has started (rows are relative to the configured
//! first dynamic row):
//!
//! ```text
//! File:           movie.mkv                     <- static header
//! URL:            https://...
//! Download type:  fast
//! Size / parts:   100.00MB => 10 x 10.00MB
//!
//! [Link solve]    <newest TOR/CAPTCHA message>  <- first dynamic row
//!                 [Ok: 3 / 4] :( [Badcp: 1 ...]  (only once stats exist)
//! [Progress]      12.00 MB (12.00 %)  avg. speed: ...
//! [STATUS]        <newest main message>
//! [Part 0]        <part line>                   (only with show_parts)
//! ```
//!
//! Before the dashboard starts and after it stops, log messages are printed
//! as plain scrolling lines instead.

use std::io;

use console::{style, StyledObject};

use super::{InteractiveReporter, Renderer, Reporter};
use crate::channels::{Channel, ChannelMessage};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::format::{format_hms, format_mb, format_mbps};
use crate::terminal::{AnsiTerminal, Terminal};
use crate::types::{CaptchaStats, DownloadInfo, LogLevel, RunSummary, TickSummary};

/// Rows between the end of the part lines and the teardown cursor position.
const FOOTER_OFFSET: u16 = 4;

/// Extra rows skipped before the summary on a clean stop.
const SUMMARY_GAP: u16 = 2;

/// Terminal colors, optionally disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colors on when standard output supports them.
    pub fn detect() -> Self {
        Self::new(console::colors_enabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint<'a>(
        &self,
        text: &'a str,
        f: impl FnOnce(StyledObject<&'a str>) -> StyledObject<&'a str>,
    ) -> String {
        f(style(text).force_styling(self.enabled)).to_string()
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(text, |s| s.blue())
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, |s| s.yellow())
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, |s| s.green())
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, |s| s.red())
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    /// Color `text` by severity. INFO is left as is.
    pub fn level(&self, text: &str, level: LogLevel) -> String {
        match level {
            LogLevel::Info => text.to_string(),
            LogLevel::Warning => self.yellow(text),
            LogLevel::Error => self.red(text),
        }
    }

    /// Severity color in reverse video, for non-INFO status messages.
    pub fn emphasized(&self, text: &str, level: LogLevel) -> String {
        match level {
            LogLevel::Info => self.paint(text, |s| s.reverse()),
            LogLevel::Warning => self.paint(text, |s| s.yellow().reverse()),
            LogLevel::Error => self.paint(text, |s| s.red().reverse()),
        }
    }

    /// Solver statistics line.
    pub fn stats(&self, stats: &CaptchaStats) -> String {
        format!(
            "[Ok: {} / {}] :( [Badcp: {} Limited: {} Censored: {} NetErr: {}]",
            self.green(&stats.ok.to_string()),
            self.blue(&stats.all.to_string()),
            self.red(&stats.bad.to_string()),
            self.red(&stats.lim.to_string()),
            self.red(&stats.block.to_string()),
            self.red(&stats.net.to_string()),
        )
    }
}

/// ANSI dashboard redrawn in place every tick.
#[derive(Debug)]
pub struct InteractiveRenderer<T: Terminal> {
    terminal: T,
    palette: Palette,
    show_parts: bool,
    status_start_row: u16,
    active: bool,
}

impl<T: Terminal> InteractiveRenderer<T> {
    /// Create a renderer using the layout options from `config`.
    pub fn new(terminal: T, config: &MonitorConfig) -> Self {
        Self {
            terminal,
            palette: Palette::detect(),
            show_parts: config.show_parts,
            status_start_row: config.status_start_row,
            active: false,
        }
    }

    /// Override color detection.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Whether the dashboard currently owns the screen.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Underlying terminal.
    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    fn footer_row(&self, info: &DownloadInfo) -> u16 {
        let parts = u16::try_from(info.parts).unwrap_or(u16::MAX);
        self.status_start_row
            .saturating_add(parts)
            .saturating_add(FOOTER_OFFSET)
    }

    /// Leave the dashboard: park the cursor below it and make it visible.
    ///
    /// The cursor is shown even if the move fails; the first error wins.
    fn deactivate(&mut self, row: u16) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let moved = self.terminal.move_to_row(row);
        let shown = self.terminal.show_cursor();
        moved.and(shown)
    }

    fn progress_line(&self, tick: &TickSummary) -> String {
        self.palette.yellow(&format!(
            "[Progress]\t{} MB ({:.2} %)\tavg. speed: {} MB/s\tcurr. speed: {} MB/s\tremaining: {}",
            format_mb(tick.downloaded),
            tick.percent,
            format_mbps(tick.average_bps),
            format_mbps(tick.current_bps),
            format_hms(tick.remaining),
        ))
    }

    fn status_line(&self, message: &ChannelMessage) -> String {
        let text = match message.level {
            LogLevel::Info => message.text.clone(),
            level => self.palette.emphasized(&message.text, level),
        };
        format!("{}{}", self.palette.yellow("[STATUS]\t"), text)
    }

    fn summary_line(&self, summary: &RunSummary) -> String {
        let total = if summary.is_resumed() {
            format!("/{}", format_mb(summary.total_size))
        } else {
            String::new()
        };

        format!(
            "{}Downloaded {}{} MB in {} (average speed {} MB/s)",
            self.palette.blue("Statistics:\t"),
            format_mb(summary.downloaded),
            total,
            format_hms(summary.elapsed),
            format_mbps(summary.average_bps),
        )
    }
}

impl<T: Terminal> Renderer for InteractiveRenderer<T> {
    fn log(
        &mut self,
        channel: Channel,
        message: &ChannelMessage,
        progress: bool,
    ) -> io::Result<()> {
        // The dashboard picks the message up on the next tick.
        if self.active {
            return Ok(());
        }

        let prefix = match channel {
            Channel::Network => self.palette.blue("[TOR]\t"),
            Channel::Solver => self.palette.blue("[Link solve]\t"),
            Channel::Main => String::new(),
        };
        let line = format!("{}{}", prefix, self.palette.level(&message.text, message.level));

        if progress {
            self.terminal.write_overwritable(&line)?;
        } else {
            self.terminal.write_line(&line)?;
        }
        self.terminal.flush()
    }

    fn prompt(&mut self, message: &str, level: LogLevel) -> io::Result<()> {
        let text = self.palette.level(message, level);
        self.terminal.write(&text)?;
        self.terminal.flush()
    }

    fn start(&mut self, info: &DownloadInfo) -> io::Result<()> {
        self.terminal.clear_screen()?;
        self.terminal.hide_cursor()?;
        self.active = true;

        let p = self.palette;
        self.terminal
            .write_line(&format!("{}{}", p.blue("File:\t\t"), p.bold(&info.filename)))?;
        self.terminal
            .write_line(&format!("{}{}", p.blue("URL:\t\t"), info.url))?;
        self.terminal
            .write_line(&format!("{}{}", p.blue("Download type:\t"), info.download_type))?;
        self.terminal.write_line(&format!(
            "{}{}",
            p.blue("Size / parts: \t"),
            p.bold(&format!(
                "{}MB => {} x {}MB",
                format_mb(info.total_size),
                info.parts,
                format_mb(info.part_size)
            ))
        ))?;
        self.terminal.flush()
    }

    fn render_tick(&mut self, _info: &DownloadInfo, tick: &TickSummary) -> io::Result<()> {
        let p = self.palette;
        let mut row = self.status_start_row;

        let link = &tick.link_message;
        let line = format!(
            "{}{}",
            p.yellow("[Link solve]\t"),
            p.level(&link.text, link.level)
        );
        self.terminal.write_at(row, &line)?;
        row += 1;

        if let Some(stats) = &tick.captcha_stats {
            let line = format!("{}{}", p.yellow("\t\t"), p.stats(stats));
            self.terminal.write_at(row, &line)?;
            row += 1;
        }

        let line = self.progress_line(tick);
        self.terminal.write_at(row, &line)?;
        row += 1;

        let line = self.status_line(&tick.main_message);
        self.terminal.write_at(row, &line)?;
        row += 1;

        if self.show_parts {
            for (index, part) in tick.parts.iter().enumerate() {
                let line = format!(
                    "{}\t{}",
                    p.blue(&format!("[Part {}]", index)),
                    p.level(&part.display_line, part.level)
                );
                let offset = u16::try_from(index).unwrap_or(u16::MAX);
                self.terminal.write_at(row.saturating_add(offset), &line)?;
            }
        }

        self.terminal.flush()
    }

    fn finish(&mut self, info: &DownloadInfo, summary: &RunSummary) -> io::Result<()> {
        let row = self.footer_row(info).saturating_add(SUMMARY_GAP);
        self.deactivate(row)?;

        let line = self.summary_line(summary);
        self.terminal.write_line(&line)?;
        self.terminal.flush()
    }

    fn fail(&mut self, info: &DownloadInfo, error: &MonitorError) -> io::Result<()> {
        let row = self.footer_row(info);
        self.deactivate(row)?;

        self.terminal.write_line("")?;
        let line = self.palette.red(&format!("Error: {}", error));
        self.terminal.write_line(&line)?;
        self.terminal.flush()
    }
}

impl<T: Terminal> InteractiveReporter<T> {
    /// Interactive reporter drawing on `terminal`.
    pub fn with_terminal(terminal: T, config: MonitorConfig) -> MonitorResult<Self> {
        let renderer = InteractiveRenderer::new(terminal, &config);
        Reporter::new(renderer, config)
    }
}

impl InteractiveReporter {
    /// Interactive reporter drawing on standard output.
    pub fn stdout(config: MonitorConfig) -> MonitorResult<Self> {
        Self::with_terminal(AnsiTerminal::stdout(), config)
    }
}

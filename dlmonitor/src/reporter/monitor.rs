//! The polling loop shared by both reporter variants.
//!
//! Every tick reads all parts once, feeds the byte sum into the throughput
//! estimator, and hands the aggregate to the renderer. The stop signal is
//! checked after the render, so a tick always completes before the loop
//! exits. A fatal error left by a log call between ticks ends the loop at
//! the start of the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{MonitorState, Renderer, Reporter, TerminateFn};
use crate::channels::Channel;
use crate::error::{MonitorError, MonitorResult};
use crate::format::seconds;
use crate::part::PartStatusSource;
use crate::throughput::ThroughputEstimator;
use crate::types::{DownloadInfo, PartStatus, RunSummary, TickSummary};

/// Shortest tick interval accepted by the loop.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

impl<R: Renderer> Reporter<R> {
    pub(super) async fn run_monitor(
        &self,
        info: &DownloadInfo,
        parts: &[Arc<dyn PartStatusSource>],
        stop: CancellationToken,
        terminate: TerminateFn,
    ) -> MonitorResult<RunSummary> {
        self.begin()?;
        tracing::info!(file = %info.filename, parts = parts.len(), "Monitor started");

        match self.monitor_loop(info, parts, &stop).await {
            Ok(summary) => {
                self.inner.lock().state = MonitorState::Stopped;
                tracing::info!(
                    downloaded = summary.downloaded,
                    elapsed_secs = summary.elapsed.as_secs_f64(),
                    "Monitor stopped"
                );
                Ok(summary)
            }
            Err(error) => {
                tracing::error!(error = %error, "Monitor failed");
                self.report_failure(info, &error);
                terminate();
                Err(error)
            }
        }
    }

    fn begin(&self) -> MonitorResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != MonitorState::NotStarted {
            return Err(MonitorError::AlreadyStarted);
        }
        inner.state = MonitorState::Running;
        Ok(())
    }

    fn report_failure(&self, info: &DownloadInfo, error: &MonitorError) {
        let mut inner = self.inner.lock();
        inner.state = MonitorState::Failed;
        if let Err(e) = inner.renderer.fail(info, error) {
            tracing::warn!(error = %e, "Failed to report monitor error");
        }
    }

    async fn monitor_loop(
        &self,
        info: &DownloadInfo,
        parts: &[Arc<dyn PartStatusSource>],
        stop: &CancellationToken,
    ) -> MonitorResult<RunSummary> {
        let start_bytes = total_bytes(&read_parts(parts)?);
        let start_time = Instant::now();
        let mut estimator = ThroughputEstimator::with_capacity(
            start_bytes,
            start_time.into_std(),
            self.config.window_capacity,
        );

        self.with_renderer_mut(|renderer| renderer.start(info))?;

        let mut ticker = time::interval(self.config.tick_interval.max(MIN_TICK_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut downloaded;
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => {}
                _ = ticker.tick() => {}
            }

            let pending = self.inner.lock().pending_error.take();
            if let Some(error) = pending {
                return Err(error);
            }

            let now = Instant::now();
            let statuses = read_parts(parts)?;
            downloaded = total_bytes(&statuses);
            let (average_bps, current_bps) = estimator.update(downloaded, now.into_std());
            ticks += 1;

            self.render_tick(info, statuses, downloaded, average_bps, current_bps)?;

            if stop.is_cancelled() {
                break;
            }
        }

        let elapsed = start_time.elapsed();
        let gained = downloaded.saturating_sub(start_bytes);
        let elapsed_secs = elapsed.as_secs_f64();
        let average_bps = if elapsed_secs > 0.0 {
            gained as f64 / elapsed_secs
        } else {
            0.0
        };

        let summary = RunSummary {
            downloaded: gained,
            start_bytes,
            total_size: info.total_size,
            elapsed,
            average_bps,
        };

        tracing::debug!(ticks, "Monitor loop exited");
        self.with_renderer_mut(|renderer| renderer.finish(info, &summary))?;
        Ok(summary)
    }

    fn render_tick(
        &self,
        info: &DownloadInfo,
        parts: Vec<PartStatus>,
        downloaded: u64,
        average_bps: f64,
        current_bps: f64,
    ) -> MonitorResult<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let tick = TickSummary {
            downloaded,
            total_size: info.total_size,
            percent: percent(downloaded, info.total_size),
            average_bps,
            current_bps,
            remaining: remaining(info.total_size, downloaded, average_bps),
            parts,
            link_message: inner.channels.latest_link_message().clone(),
            main_message: inner.channels.latest(Channel::Main).clone(),
            captcha_stats: inner.solver_stats,
        };

        inner
            .renderer
            .render_tick(info, &tick)
            .map_err(MonitorError::Render)
    }

    fn with_renderer_mut(
        &self,
        f: impl FnOnce(&mut R) -> std::io::Result<()>,
    ) -> MonitorResult<()> {
        f(&mut self.inner.lock().renderer).map_err(MonitorError::Render)
    }
}

/// Read every part once, in index order.
fn read_parts(parts: &[Arc<dyn PartStatusSource>]) -> MonitorResult<Vec<PartStatus>> {
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            part.status()
                .map_err(|source| MonitorError::PartStatus { index, source })
        })
        .collect()
}

fn total_bytes(statuses: &[PartStatus]) -> u64 {
    statuses.iter().map(|status| status.bytes_downloaded).sum()
}

/// Percentage of `total` covered by `downloaded`; 0 for an empty download.
pub(crate) fn percent(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    downloaded as f64 / total as f64 * 100.0
}

/// Time left at `average_bps`; 0 when the rate is unknown or nothing is left.
pub(crate) fn remaining(total: u64, downloaded: u64, average_bps: f64) -> Duration {
    if average_bps <= 0.0 {
        return Duration::ZERO;
    }
    seconds(total.saturating_sub(downloaded) as f64 / average_bps)
}

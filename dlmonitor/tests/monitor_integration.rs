//! Integration tests for the monitoring loop.
//!
//! These tests drive both reporter variants end to end on tokio's paused
//! clock:
//! - Structured stream ordering and record shapes
//! - Interactive teardown on stop and on failure
//! - Log channels and the operator log file
//!
//! Run with: `cargo test --test monitor_integration`

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use dlmonitor::{
    AnsiTerminal, DownloadInfo, Frontend, InteractiveReporter, LogLevel, LogSink, MonitorConfig,
    MonitorError, MonitorState, PartStatus, PartStatusError, PartStatusSource, SharedPartStatus,
    StructuredReporter, TerminateFn,
};

// ============================================================================
// Helper Functions
// ============================================================================

const MB: u64 = 1024 * 1024;

/// Cloneable in-memory output stream.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    fn records(&self) -> Vec<Value> {
        self.contents()
            .lines()
            .map(|line| serde_json::from_str(line).expect("every line is JSON"))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Part whose status read fails on the given call.
struct BrokenPart {
    reads: AtomicUsize,
    fail_on: usize,
}

impl PartStatusSource for BrokenPart {
    fn status(&self) -> Result<PartStatus, PartStatusError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) >= self.fail_on {
            Err(PartStatusError::new("socket closed"))
        } else {
            Ok(PartStatus::new("ok", LogLevel::Info, 0))
        }
    }
}

/// Writer standing in for a log file on a full disk.
#[derive(Debug)]
struct FullDisk;

impl Write for FullDisk {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn download(total: u64, parts: usize) -> DownloadInfo {
    DownloadInfo::new(
        "archive.zip",
        "https://example.com/archive.zip",
        "fast",
        total,
        parts,
    )
}

fn terminate_counter() -> (TerminateFn, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let clone = Arc::clone(&calls);
    (
        Box::new(move || {
            clone.fetch_add(1, Ordering::SeqCst);
        }),
        calls,
    )
}

fn status_of(record: &Value) -> Option<&str> {
    record.get("status").and_then(Value::as_str)
}

// ============================================================================
// Structured Reporter
// ============================================================================

/// Two parts finishing a 100MB download: the tick reports 100%.
#[tokio::test(start_paused = true)]
async fn test_structured_full_download_scenario() {
    let out = SharedBuffer::default();
    let reporter = StructuredReporter::with_writer(out.clone(), MonitorConfig::default()).unwrap();

    let first = Arc::new(SharedPartStatus::new());
    let second = Arc::new(SharedPartStatus::new());
    let parts: Vec<Arc<dyn PartStatusSource>> = vec![first.clone(), second.clone()];
    let stop = CancellationToken::new();
    let (terminate, calls) = terminate_counter();

    let driver = {
        let stop = stop.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(400)).await;
            first.set_bytes(50 * MB);
            second.set_bytes(50 * MB);
            tokio::time::sleep(Duration::from_millis(1_600)).await;
            stop.cancel();
        }
    };

    let info = download(100 * MB, 2);
    let (result, _) = tokio::join!(
        reporter.run(&info, &parts, stop.clone(), terminate),
        driver
    );
    let summary = result.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(reporter.state(), MonitorState::Stopped);
    assert_eq!(summary.elapsed, Duration::from_secs(2));

    let records = out.records();
    let progress: Vec<&Value> = records
        .iter()
        .filter(|r| status_of(r) == Some("DOWNLOADING"))
        .collect();

    assert_eq!(progress[0]["percent"], "0.00 %");
    let last = progress.last().unwrap();
    assert_eq!(last["percent"], "100.00 %");
    assert_eq!(last["downloaded"], "100.00 MB");
    assert_eq!(last["size"], "100.00 MB");
    assert_eq!(last["remaining"], "0:00:00");
    assert_eq!(last["file"], "archive.zip");

    let completed = records.last().unwrap();
    assert_eq!(status_of(completed), Some("COMPLETED"));
    assert_eq!(completed["duration"], "0:00:02");
    assert_eq!(completed["avg_speed"], "50.00 MB/s");
}

/// Stream ordering: one INITIALIZING first, one terminal record last,
/// log records interleaved with progress.
#[tokio::test(start_paused = true)]
async fn test_structured_stream_ordering() {
    let out = SharedBuffer::default();
    let reporter = Arc::new(
        StructuredReporter::with_writer(out.clone(), MonitorConfig::default()).unwrap(),
    );
    let part = Arc::new(SharedPartStatus::new());
    let parts: Vec<Arc<dyn PartStatusSource>> = vec![part.clone()];
    let stop = CancellationToken::new();
    let (terminate, _) = terminate_counter();

    let driver = {
        let reporter = Arc::clone(&reporter);
        let stop = stop.clone();
        async move {
            for step in 1..=6u64 {
                tokio::time::sleep(Duration::from_millis(300)).await;
                part.set_bytes(step * MB);
                reporter
                    .log_network(&format!("circuit {step}"), LogLevel::Info, false)
                    .unwrap();
                reporter
                    .log_solver("solving", LogLevel::Info, true)
                    .unwrap();
                reporter.log_main("main info", LogLevel::Info, false).unwrap();
            }
            stop.cancel();
        }
    };

    let info = download(10 * MB, 1);
    let (result, _) = tokio::join!(
        reporter.run(&info, &parts, stop.clone(), terminate),
        driver
    );
    result.unwrap();

    // Logging after completion must not follow the terminal record.
    reporter.log_network("late", LogLevel::Info, false).unwrap();

    let records = out.records();
    assert_eq!(status_of(&records[0]), Some("INITIALIZING"));
    assert_eq!(
        records
            .iter()
            .filter(|r| status_of(r) == Some("INITIALIZING"))
            .count(),
        1
    );
    assert_eq!(status_of(records.last().unwrap()), Some("COMPLETED"));
    assert_eq!(
        records
            .iter()
            .filter(|r| matches!(status_of(r), Some("COMPLETED") | Some("ERROR")))
            .count(),
        1
    );

    let tor: Vec<&Value> = records.iter().filter(|r| r.get("tor").is_some()).collect();
    let captcha = records.iter().filter(|r| r.get("captcha").is_some()).count();
    assert_eq!(tor.len(), 6);
    assert_eq!(tor[0]["tor"], "circuit 1");
    assert_eq!(captcha, 6);
    // INFO main messages are not part of the stream.
    assert!(records.iter().all(|r| r.get("main").is_none()));

    // Percent never decreases while bytes only grow.
    let percents: Vec<f64> = records
        .iter()
        .filter(|r| status_of(r) == Some("DOWNLOADING"))
        .map(|r| {
            r["percent"]
                .as_str()
                .unwrap()
                .trim_end_matches(" %")
                .parse()
                .unwrap()
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
}

/// A failing part yields exactly one ERROR record and one terminate call.
#[tokio::test(start_paused = true)]
async fn test_structured_part_failure() {
    let out = SharedBuffer::default();
    let reporter = StructuredReporter::with_writer(out.clone(), MonitorConfig::default()).unwrap();
    let parts: Vec<Arc<dyn PartStatusSource>> = vec![Arc::new(BrokenPart {
        reads: AtomicUsize::new(0),
        fail_on: 2,
    })];
    let (terminate, calls) = terminate_counter();

    let err = reporter
        .run(&download(MB, 1), &parts, CancellationToken::new(), terminate)
        .await
        .unwrap_err();

    assert!(matches!(err, MonitorError::PartStatus { index: 0, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(reporter.state(), MonitorState::Failed);

    let records = out.records();
    let errors: Vec<&Value> = records
        .iter()
        .filter(|r| status_of(r) == Some("ERROR"))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0]["message"],
        "part 0 status unavailable: socket closed"
    );
    assert_eq!(status_of(records.last().unwrap()), Some("ERROR"));
    assert!(records.iter().all(|r| status_of(r) != Some("COMPLETED")));
}

/// A log file write failing mid-run stops the monitor with one ERROR record.
#[tokio::test(start_paused = true)]
async fn test_structured_sink_failure_stops_monitor() {
    let out = SharedBuffer::default();
    let reporter = StructuredReporter::with_writer(out.clone(), MonitorConfig::default())
        .unwrap()
        .with_log_sink(LogSink::from_writer("/x.log", FullDisk));
    let parts: Vec<Arc<dyn PartStatusSource>> = vec![Arc::new(SharedPartStatus::new())];
    let (terminate, calls) = terminate_counter();

    let logger = async {
        tokio::time::sleep(Duration::from_millis(700)).await;
        reporter.log_network("circuit built", LogLevel::Info, false)
    };

    let info = download(10 * MB, 1);
    let (result, logged) = tokio::join!(
        reporter.run(&info, &parts, CancellationToken::new(), terminate),
        logger
    );

    assert!(matches!(logged, Err(MonitorError::SinkWrite { .. })));
    assert!(matches!(result, Err(MonitorError::SinkWrite { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(reporter.state(), MonitorState::Failed);

    let records = out.records();
    // The message still reaches the stream even though the file write failed.
    assert!(records.iter().any(|r| r["tor"] == "circuit built"));

    let errors: Vec<&Value> = records
        .iter()
        .filter(|r| status_of(r) == Some("ERROR"))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0]["message"],
        "failed to write log file /x.log: disk full"
    );
    assert_eq!(status_of(records.last().unwrap()), Some("ERROR"));
    assert!(records.iter().all(|r| status_of(r) != Some("COMPLETED")));
}

/// ERROR-level main messages are surfaced in the stream.
#[test]
fn test_structured_main_error_surfaced() {
    let out = SharedBuffer::default();
    let reporter = StructuredReporter::with_writer(out.clone(), MonitorConfig::default()).unwrap();

    reporter
        .log_main("Part 3 failed", LogLevel::Error, false)
        .unwrap();

    let records = out.records();
    assert_eq!(status_of(&records[0]), Some("INITIALIZING"));
    assert_eq!(records[1]["main"], "Part 3 failed");
    assert_eq!(records[1]["level"], "ERROR");
}

// ============================================================================
// Interactive Reporter
// ============================================================================

/// Failure restores the cursor on a real ANSI terminal stream.
#[tokio::test(start_paused = true)]
async fn test_interactive_failure_restores_cursor() {
    let out = SharedBuffer::default();
    let reporter = InteractiveReporter::with_terminal(
        AnsiTerminal::new(out.clone()),
        MonitorConfig::default().with_show_parts(true),
    )
    .unwrap();
    let parts: Vec<Arc<dyn PartStatusSource>> = vec![Arc::new(BrokenPart {
        reads: AtomicUsize::new(0),
        fail_on: 3,
    })];
    let (terminate, calls) = terminate_counter();

    let err = reporter
        .run(&download(MB, 1), &parts, CancellationToken::new(), terminate)
        .await
        .unwrap_err();

    assert!(matches!(err, MonitorError::PartStatus { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let output = out.contents();
    let hide = output.find("\x1b[?25l").expect("cursor hidden");
    let show = output.rfind("\x1b[?25h").expect("cursor restored");
    assert!(hide < show);
    assert!(output.contains("socket closed"));
    assert!(output.contains("[Part 0]"));
}

/// A clean stop prints the statistics line after restoring the cursor.
#[tokio::test(start_paused = true)]
async fn test_interactive_stop_prints_summary() {
    let out = SharedBuffer::default();
    let reporter =
        InteractiveReporter::with_terminal(AnsiTerminal::new(out.clone()), MonitorConfig::default())
            .unwrap();
    let part = Arc::new(SharedPartStatus::new());
    let parts: Vec<Arc<dyn PartStatusSource>> = vec![part.clone()];
    let stop = CancellationToken::new();
    let (terminate, _) = terminate_counter();

    reporter
        .log_main("Starting download", LogLevel::Info, false)
        .unwrap();

    let driver = {
        let stop = stop.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            part.set_bytes(3 * MB);
            stop.cancel();
        }
    };

    let info = download(10 * MB, 1);
    let (result, _) = tokio::join!(
        reporter.run(&info, &parts, stop.clone(), terminate),
        driver
    );
    let summary = result.unwrap();
    assert_eq!(summary.downloaded, 3 * MB);

    let output = out.contents();
    let show = output.rfind("\x1b[?25h").expect("cursor restored");
    let stats = output.rfind("Downloaded 3.00 MB in 0:00:03").expect("summary");
    assert!(show < stats);
    assert!(output.contains("average speed 1.00 MB/s"));
    // Logged before the dashboard started, so printed as a plain line.
    assert!(output.starts_with("Starting download\n"));
}

/// The operator log file collects durable messages from every channel.
#[test]
fn test_log_file_records_durable_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.log");
    let out = SharedBuffer::default();
    let reporter = StructuredReporter::with_writer(
        out.clone(),
        MonitorConfig::default().with_log_file(&path),
    )
    .unwrap();

    reporter
        .log_network("circuit built", LogLevel::Info, false)
        .unwrap();
    reporter
        .log_solver("12% solved", LogLevel::Info, true)
        .unwrap();
    reporter
        .log_solver("wrong answer", LogLevel::Warning, false)
        .unwrap();
    reporter
        .log_main("Part 1 failed", LogLevel::Error, false)
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(" TOR \t[INFO] circuit built"));
    assert!(lines[1].ends_with(" CAPTCHA\t[WARNING] wrong answer"));
    assert!(lines[2].ends_with(" MAIN\t[ERROR] Part 1 failed"));
}

//! dlmonitor CLI - Progress monitor demo
//!
//! Runs a simulated multi-part download and reports it either as the
//! interactive dashboard or, with `--json` or when standard output is not a
//! terminal, as line-delimited JSON records.

mod error;
mod simulate;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dlmonitor::logging::init_file_logging;
use dlmonitor::{
    DownloadInfo, Frontend, InteractiveReporter, LogLevel, MonitorConfig, StructuredReporter,
    TerminateFn,
};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::simulate::{join_all, Simulation};

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "dlmonitor")]
#[command(version, about = "Live progress monitor for multi-part downloads", long_about = None)]
struct Args {
    /// Emit line-delimited JSON instead of the dashboard
    #[arg(long)]
    json: bool,

    /// Number of parts to download in parallel
    #[arg(long, default_value_t = 4)]
    parts: usize,

    /// Total download size in MB
    #[arg(long, default_value_t = 64)]
    size_mb: u64,

    /// Download rate of each part in MB/s
    #[arg(long, default_value_t = 2.0)]
    rate: f64,

    /// Show one line per part on the dashboard
    #[arg(long)]
    show_parts: bool,

    /// Milliseconds between progress updates
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,

    /// Append log messages to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write diagnostic tracing output to this file
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        if !e.is_reported() {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let _guard = args.diagnostics.as_deref().and_then(init_file_logging);

    let mut config = MonitorConfig::default()
        .with_tick_interval(Duration::from_millis(args.tick_ms))
        .with_show_parts(args.show_parts);
    if let Some(path) = &args.log_file {
        config = config.with_log_file(path);
    }

    let structured = args.json || !atty::is(atty::Stream::Stdout);
    let frontend: Arc<dyn Frontend> = if structured {
        Arc::new(StructuredReporter::stdout(config)?)
    } else {
        Arc::new(InteractiveReporter::stdout(config)?)
    };

    let total = args.size_mb.saturating_mul(BYTES_PER_MB);
    let info = DownloadInfo::new(
        "simulated.bin",
        "https://example.com/simulated.bin",
        "simulated",
        total,
        args.parts,
    );
    let simulation = Simulation::new(total, args.parts, args.rate * BYTES_PER_MB as f64)?;

    let stop = CancellationToken::new();
    let shutdown = Arc::new(AtomicBool::new(false));

    let interrupt = stop.clone();
    ctrlc::set_handler(move || interrupt.cancel())?;

    let terminate: TerminateFn = {
        let shutdown = Arc::clone(&shutdown);
        Box::new(move || shutdown.store(true, Ordering::SeqCst))
    };

    tracing::info!(
        parts = args.parts,
        size_mb = args.size_mb,
        structured,
        "Starting simulated download"
    );
    frontend.log_main("Starting download", LogLevel::Info, false)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let sources = simulation.sources();
    let handles = simulation.spawn(Arc::clone(&frontend), stop.clone(), Arc::clone(&shutdown));
    let result = runtime.block_on(frontend.run(&info, &sources, stop, terminate));

    shutdown.store(true, Ordering::SeqCst);
    join_all(handles)?;

    let summary = result.map_err(|e| {
        if structured {
            CliError::Monitor(e)
        } else {
            CliError::Reported(e)
        }
    })?;
    tracing::info!(
        downloaded = summary.downloaded,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Simulated download finished"
    );
    Ok(())
}

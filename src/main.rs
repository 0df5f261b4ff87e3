//! logsignal: extract charted signals from timestamped text logs
//!
//! Reads a log, applies the configured patterns chunk by chunk, and writes a
//! JSON chart document with the signals, the time-sorted points, the
//! categorical codes and the renderer-ready records.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use logsignal::series::DEFAULT_CHUNK_SIZE;
use logsignal::{
    process_log, ChartDocument, ChartKind, ChartRecordFormatter, ChartState, DataPoint,
    PatternSet, PipelineConfig, RunObserver, RunOutcome, Signal, SignalGroup, StatusUpdate,
    StringValueMap,
};

#[derive(Debug, Parser)]
#[command(name = "logsignal")]
#[command(about = "Extract charted signals from timestamped text logs")]
#[command(version)]
struct Command {
    /// Log file to read (stdin if omitted or "-")
    log: Option<PathBuf>,

    /// JSON pattern file: {"patterns": [{"name": ..., "regex": ...}]}
    #[arg(short = 'P', long)]
    patterns: Option<PathBuf>,

    /// Inline pattern as name=regex (repeatable, added after the pattern file)
    #[arg(short, long)]
    pattern: Vec<String>,

    /// Lines processed per scheduling step
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Chart kind recorded in the output document
    #[arg(long, value_enum, default_value_t = ChartKind::Line)]
    chart_kind: ChartKind,

    /// Write the chart document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    #[arg(short, long)]
    verbose: bool,
}

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}";

/// Terminal observer: keeps the chart state and mirrors progress to a
/// progress bar and the log.
struct ConsoleObserver {
    chart: ChartState,
    progress: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new(show_progress: bool) -> Self {
        let progress = show_progress.then(|| {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(PROGRESS_TEMPLATE)
                    .expect("Failed to set progress bar template")
                    .progress_chars("#>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self {
            chart: ChartState::new(),
            progress,
        }
    }

    fn finish(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn reset(&self) {
        self.chart.reset();
    }

    fn publish_signals(&self, signals: &[Signal], groups: &[SignalGroup]) {
        for signal in signals {
            tracing::debug!("Signal {} ({}): {}", signal.name, signal.id, signal.pattern);
        }
        self.chart.publish_signals(signals, groups);
    }

    fn set_processing(&self, processing: bool) {
        self.chart.set_processing(processing);
    }

    fn status(&self, update: &StatusUpdate) {
        match (&self.progress, update) {
            (Some(pb), StatusUpdate::Chunk { chunk, total, .. }) => {
                pb.set_length(*total as u64);
                pb.set_position(*chunk as u64);
            }
            (Some(pb), other) => pb.set_message(other.to_string()),
            (None, _) => {}
        }
        self.chart.status(update);
    }

    fn clear_status(&self) {
        if let Some(pb) = &self.progress {
            pb.set_message("");
        }
        self.chart.clear_status();
    }

    fn notify(&self, message: &str) {
        tracing::debug!("{}", message);
        self.chart.notify(message);
    }

    fn notify_error(&self, message: &str) {
        tracing::error!("{}", message);
        self.chart.notify_error(message);
    }

    fn publish_result(&self, points: &[DataPoint], string_values: &StringValueMap) {
        self.chart.publish_result(points, string_values);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();
}

fn load_patterns(opts: &Command) -> Result<PatternSet> {
    let mut set = match &opts.patterns {
        Some(path) => PatternSet::load(path)?,
        None => PatternSet::new(),
    };
    for arg in &opts.pattern {
        set.add_from_str(arg)?;
    }
    if set.is_empty() {
        bail!("No patterns given; use --patterns FILE or --pattern name=regex");
    }
    Ok(set)
}

/// Read the whole log. Invalid UTF-8 is replaced rather than rejected, so a
/// stray byte only affects its own line.
fn read_log(path: Option<&Path>) -> Result<String> {
    let bytes = match path {
        Some(path) if path != Path::new("-") => fs::read(path)
            .with_context(|| format!("Failed to read log file {}", path.display()))?,
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read log from stdin")?;
            buf
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_document(doc: &ChartDocument, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let opts = Command::parse();
    init_logging(opts.verbose);

    let patterns = load_patterns(&opts)?;
    let text = read_log(opts.log.as_deref())?;
    let config = PipelineConfig::default().with_chunk_size(opts.chunk_size);

    let observer = ConsoleObserver::new(!opts.no_progress);
    let mut formatter = ChartRecordFormatter::new();
    let outcome = process_log(
        text,
        patterns.patterns(),
        config,
        &observer,
        &mut formatter,
    );
    observer.finish();

    let run = match outcome? {
        RunOutcome::Completed(run) => Some(run),
        RunOutcome::NoData => {
            tracing::warn!("No lines matched any pattern; writing an empty document");
            None
        }
        RunOutcome::Failed(err) => return Err(err.context("Extraction failed")),
        RunOutcome::Superseded => bail!("Run was superseded"),
    };

    let doc = ChartDocument::new(
        opts.chart_kind,
        observer.chart.signals(),
        observer.chart.groups(),
        run,
        formatter.into_records(),
    );
    write_document(&doc, opts.output.as_deref())
}

//! Chunked, cooperatively scheduled extraction runs.
//!
//! A [`ChunkScheduler`] owns everything a run mutates. The host drives it by
//! calling [`ChunkScheduler::advance`]; each call does one bounded piece of
//! work and returns a [`Step`] telling the host whether to call again (and how
//! long to wait first) or that the run is over.
//!
//! Steps, in order:
//!
//! ```text
//! start ─► chunk 1 ─► chunk 2 ─► ... ─► chunk n ─► finalize ─┬─► format ─► done
//!                                                             └─► (large) yield(delay) ─► format + heartbeat ─► done
//! ```
//!
//! Chunk size only changes how many lines one step handles. The extracted
//! points and categorical map are the same for every chunk size.

use std::ops::Range;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::aggregate::ForwardFillAggregator;
use crate::config::PipelineConfig;
use crate::extract::SignalExtractor;
use crate::finalize::{catch_failure, finalize, format_direct, format_with_heartbeat};
use crate::finalize::{FinalizedRun, Formatter};
use crate::generation::RunToken;
use crate::observer::{RunObserver, StatusUpdate};
use crate::series::{Pattern, Signal, SignalGroup};
use crate::timestamp::parse_line_timestamp;

/// What the host should do after a call to [`ChunkScheduler::advance`].
#[derive(Debug)]
pub enum Step {
    /// More work remains; call `advance` again after `delay`.
    Yield { delay: Duration },
    /// The run ended during this call.
    Complete(RunOutcome),
    /// The run had already ended; its outcome was returned earlier.
    Finished,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Points were extracted and the formatter succeeded.
    Completed(FinalizedRun),
    /// No line produced a data point.
    NoData,
    /// Finalization or formatting failed; reported to the observer.
    Failed(anyhow::Error),
    /// A newer run began before this one finished.
    Superseded,
}

enum Phase {
    Chunks,
    Finalize,
    Handoff(FinalizedRun),
    Done,
}

/// Mutable per-run state carried across ticks.
#[derive(Debug, Default)]
struct RunState {
    aggregator: ForwardFillAggregator,
    next_chunk: usize,
    total_chunks: usize,
    last_decile: u8,
}

/// Drives one extraction run, one chunk per tick.
pub struct ChunkScheduler {
    text: String,
    lines: Vec<Range<usize>>,
    config: PipelineConfig,
    extractor: SignalExtractor,
    state: RunState,
    phase: Phase,
    token: RunToken,
}

/// Byte ranges of each `\n`-separated line, without a trailing `\r`.
fn split_lines(text: &str) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for line in text.split('\n') {
        let end = start + line.len();
        let content_end = if line.ends_with('\r') { end - 1 } else { end };
        lines.push(start..content_end);
        start = end + 1;
    }
    lines
}

impl ChunkScheduler {
    /// Set up a run and publish its signals.
    ///
    /// Resets the observer's chart state, publishes one signal per pattern in
    /// a single default group, and raises the processing flag. Fails, before
    /// touching the observer, only on invalid configuration or duplicate
    /// pattern names.
    pub fn start(
        text: impl Into<String>,
        patterns: &[Pattern],
        config: PipelineConfig,
        observer: &dyn RunObserver,
        token: RunToken,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Self> {
        config.validate()?;
        let extractor = SignalExtractor::new(patterns)?;
        let text = text.into();
        let lines = split_lines(&text);
        let total_chunks = lines.len().div_ceil(config.chunk_size).max(1);

        observer.reset();
        let signals = Signal::from_patterns(patterns, rng);
        let groups = vec![SignalGroup::default_for(&signals)];
        observer.publish_signals(&signals, &groups);
        observer.set_processing(true);

        tracing::info!(
            "Starting run {}: {} lines, {} patterns ({} disabled), {} chunks of {}",
            token.id(),
            lines.len(),
            extractor.pattern_count(),
            extractor.failed_patterns().count(),
            total_chunks,
            config.chunk_size
        );

        Ok(Self {
            text,
            lines,
            config,
            extractor,
            state: RunState {
                total_chunks,
                ..RunState::default()
            },
            phase: Phase::Chunks,
            token,
        })
    }

    pub fn total_chunks(&self) -> usize {
        self.state.total_chunks
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Do the next piece of work. Never panics on bad input and never returns
    /// an error; failures end the run with [`RunOutcome::Failed`].
    pub fn advance(&mut self, observer: &dyn RunObserver, formatter: &mut dyn Formatter) -> Step {
        if matches!(self.phase, Phase::Done) {
            return Step::Finished;
        }
        if !self.token.is_current() {
            tracing::debug!("Run {} superseded, stopping", self.token.id());
            self.phase = Phase::Done;
            return Step::Complete(RunOutcome::Superseded);
        }

        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Chunks => self.process_next_chunk(observer),
            Phase::Finalize => self.finalize(observer, formatter),
            Phase::Handoff(run) => {
                let interval = self.config.heartbeat_interval;
                let result = format_with_heartbeat(&run, formatter, observer, interval);
                Step::Complete(Self::settle(run, result, observer))
            }
            Phase::Done => Step::Finished,
        }
    }

    fn process_next_chunk(&mut self, observer: &dyn RunObserver) -> Step {
        let chunk_size = self.config.chunk_size;
        let start = (self.state.next_chunk * chunk_size).min(self.lines.len());
        let end = (start + chunk_size).min(self.lines.len());

        let mut emitted = 0usize;
        for range in &self.lines[start..end] {
            let line = &self.text[range.clone()];
            let Some(timestamp) = parse_line_timestamp(line) else {
                continue;
            };
            let fresh = self.extractor.extract(line);
            if self.state.aggregator.record_line(timestamp, fresh) {
                emitted += 1;
            }
        }

        self.state.next_chunk += 1;
        let done = self.state.next_chunk;
        let total = self.state.total_chunks;
        let percent = (done * 100 / total) as u8;
        tracing::debug!(
            "Chunk {}/{}: lines {}..{}, {} points",
            done,
            total,
            start,
            end,
            emitted
        );

        observer.status(&StatusUpdate::Chunk {
            chunk: done,
            total,
            percent,
        });
        let decile = percent / 10;
        if decile > self.state.last_decile {
            self.state.last_decile = decile;
            observer.notify(&format!("processed {percent}% of lines"));
        }

        if done < total {
            self.phase = Phase::Chunks;
        } else {
            observer.status(&StatusUpdate::Finalizing {
                points: self.state.aggregator.points().len(),
            });
            self.phase = Phase::Finalize;
        }
        Step::Yield {
            delay: Duration::ZERO,
        }
    }

    fn finalize(&mut self, observer: &dyn RunObserver, formatter: &mut dyn Formatter) -> Step {
        let aggregator = std::mem::take(&mut self.state.aggregator);
        let run = match catch_failure(|| Ok(finalize(aggregator))) {
            Ok(Some(run)) => run,
            Ok(None) => {
                tracing::warn!("No data points matched the configured patterns");
                observer.status(&StatusUpdate::NoData);
                observer.notify_error("No data points matched the configured patterns");
                observer.set_processing(false);
                return Step::Complete(RunOutcome::NoData);
            }
            Err(err) => return Step::Complete(Self::settle_failure(err, observer)),
        };

        observer.publish_result(&run.points, &run.string_values);
        observer.status(&StatusUpdate::Extracted { points: run.len() });
        tracing::info!(
            "Extracted {} points, {} categorical signals",
            run.len(),
            run.string_values.len()
        );

        if run.len() > self.config.large_dataset_threshold {
            observer.status(&StatusUpdate::Formatting { points: run.len() });
            self.phase = Phase::Handoff(run);
            return Step::Yield {
                delay: self.config.handoff_delay,
            };
        }

        let result = format_direct(&run, formatter);
        Step::Complete(Self::settle(run, result, observer))
    }

    fn settle(run: FinalizedRun, result: Result<()>, observer: &dyn RunObserver) -> RunOutcome {
        match result {
            Ok(()) => {
                observer.set_processing(false);
                RunOutcome::Completed(run)
            }
            Err(err) => Self::settle_failure(err, observer),
        }
    }

    fn settle_failure(err: anyhow::Error, observer: &dyn RunObserver) -> RunOutcome {
        tracing::warn!("Run failed during finalization: {:#}", err);
        observer.notify_error(&format!("Failed to finalize extracted data: {err:#}"));
        observer.set_processing(false);
        observer.clear_status();
        RunOutcome::Failed(err)
    }
}

/// Drive a run until it ends, sleeping for every requested delay.
pub fn run_to_completion(
    mut scheduler: ChunkScheduler,
    observer: &dyn RunObserver,
    formatter: &mut dyn Formatter,
) -> RunOutcome {
    loop {
        match scheduler.advance(observer, formatter) {
            Step::Yield { delay } => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            Step::Complete(outcome) => return outcome,
            Step::Finished => return RunOutcome::Failed(anyhow!("run already finished")),
        }
    }
}

/// Start a run with a fresh token and drive it to completion.
pub fn process_log(
    text: impl Into<String>,
    patterns: &[Pattern],
    config: PipelineConfig,
    observer: &dyn RunObserver,
    formatter: &mut dyn Formatter,
) -> Result<RunOutcome> {
    let scheduler = ChunkScheduler::start(
        text,
        patterns,
        config,
        observer,
        RunToken::detached(),
        &mut rand::rng(),
    )?;
    Ok(run_to_completion(scheduler, observer, formatter))
}

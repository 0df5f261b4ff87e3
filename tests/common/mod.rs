//! Common test utilities for logsignal integration tests.

use logsignal::{
    process_log, ChartRecordFormatter, ChartState, FinalizedRun, Pattern, PipelineConfig,
    RunOutcome,
};

/// The three-line example log used throughout the tests.
#[allow(dead_code)]
pub const EXAMPLE_LOG: &str = "2024/01/01 00:00:00.000000 temp=20
2024/01/01 00:00:01.000000 temp=21 status=ok
2024/01/01 00:00:02.000000 status=warn
";

#[allow(dead_code)]
pub fn example_patterns() -> Vec<Pattern> {
    vec![
        Pattern::new("temp", r"temp=(\d+)"),
        Pattern::new("status", r"status=(\w+)"),
    ]
}

/// Format a log line at `sec` seconds past 2024-01-01 00:00:00.
#[allow(dead_code)]
pub fn line_at(sec: u32, body: &str) -> String {
    format!(
        "2024/01/01 {:02}:{:02}:{:02}.{:06} {body}",
        sec / 3600,
        (sec / 60) % 60,
        sec % 60,
        (sec * 7919) % 1_000_000
    )
}

/// Run the whole pipeline and return the observer with the outcome.
#[allow(dead_code)]
pub fn run(text: &str, patterns: &[Pattern], chunk_size: usize) -> (ChartState, RunOutcome) {
    let state = ChartState::new();
    let mut formatter = ChartRecordFormatter::new();
    let outcome = process_log(
        text,
        patterns,
        PipelineConfig::default().with_chunk_size(chunk_size),
        &state,
        &mut formatter,
    )
    .expect("Failed to start run");
    (state, outcome)
}

/// Run the pipeline and unwrap a completed result.
#[allow(dead_code)]
pub fn run_completed(text: &str, patterns: &[Pattern], chunk_size: usize) -> FinalizedRun {
    match run(text, patterns, chunk_size).1 {
        RunOutcome::Completed(run) => run,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

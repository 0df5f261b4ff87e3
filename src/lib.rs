//! logsignal library - chunked extraction of charted signals from text logs.
//!
//! Each log line that starts with a `YYYY/MM/DD HH:MM:SS.ffffff` timestamp is
//! run through a set of named regular expressions. Captured values become
//! per-signal time series, forward-filled between matches, with string values
//! given categorical codes so they can share a numeric chart axis.
//!
//! # Modules
//!
//! - [`scheduler`] - Chunked, cooperatively scheduled runs
//! - [`pattern`] - Pattern registry loading and regex compilation
//! - [`timestamp`] - Line timestamp recognition
//! - [`extract`] - Per-line signal extraction
//! - [`aggregate`] - Forward-fill aggregation
//! - [`encode`] - Categorical codes for string values
//! - [`finalize`] - Chronological sort and formatter hand-off
//! - [`observer`] - Status and chart-state side channel
//! - [`chart`] - Renderer-ready records and chart helpers
//!
//! # Example
//!
//! ```no_run
//! use logsignal::{process_log, ChartRecordFormatter, ChartState, PatternSet, PipelineConfig};
//!
//! let mut patterns = PatternSet::new();
//! patterns.add_from_str(r"temp=temp=(\d+)").expect("valid pattern");
//!
//! let state = ChartState::new();
//! let mut formatter = ChartRecordFormatter::new();
//! let _outcome = process_log(
//!     "2024/01/01 00:00:00.000000 temp=20\n",
//!     patterns.patterns(),
//!     PipelineConfig::default(),
//!     &state,
//!     &mut formatter,
//! )
//! .expect("Failed to start run");
//! ```

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod encode;
pub mod extract;
pub mod finalize;
pub mod generation;
pub mod observer;
pub mod pattern;
pub mod scheduler;
pub mod series;
pub mod timestamp;

// Re-export for convenience
pub use chart::{
    BrushSelection, ChartDocument, ChartKind, ChartRecord, ChartRecordFormatter, TimeWindow,
};
pub use config::PipelineConfig;
pub use finalize::{FinalizedRun, Formatter};
pub use generation::{RunGeneration, RunToken};
pub use observer::{ChartState, RunObserver, StatusUpdate};
pub use pattern::{PatternError, PatternSet};
pub use scheduler::{process_log, run_to_completion, ChunkScheduler, RunOutcome, Step};
pub use series::{DataPoint, Pattern, Signal, SignalGroup, StringValueMap, Value};

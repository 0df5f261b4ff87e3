//! Renderer-ready chart records and the chart-facing helpers.
//!
//! [`ChartRecordFormatter`] is the default [`Formatter`]: it flattens each data
//! point into numeric columns, replacing string values with their categorical
//! code so every signal can share a numeric axis. The other types describe
//! what a chart is given (kind, visible window) and what it reports back when
//! the user brushes a range.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::encode::numeric_value;
use crate::finalize::{FinalizedRun, Formatter};
use crate::series::{DataPoint, Signal, SignalGroup, StringValueMap};

/// How the chart draws its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Step,
    Scatter,
}

/// One renderer-ready row.
///
/// # Fields
/// - `ts_ms`: Milliseconds since the Unix epoch, timestamps read as UTC
/// - `time`: The same instant as text, for axis labels
/// - `values`: Signal name -> numeric value (categorical codes for strings)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    pub ts_ms: i64,
    pub time: String,
    pub values: BTreeMap<String, f64>,
}

/// Default formatter producing [`ChartRecord`]s.
#[derive(Debug, Default)]
pub struct ChartRecordFormatter {
    records: Vec<ChartRecord>,
}

impl ChartRecordFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ChartRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ChartRecord> {
        self.records
    }
}

impl Formatter for ChartRecordFormatter {
    fn format(&mut self, points: &[DataPoint], string_values: &StringValueMap) -> Result<()> {
        let mut records = Vec::with_capacity(points.len());
        for point in points {
            let mut values = BTreeMap::new();
            for (signal, value) in &point.values {
                let Some(numeric) = numeric_value(string_values, signal, value) else {
                    bail!("{signal}: value '{value}' has no categorical code");
                };
                values.insert(signal.clone(), numeric);
            }
            records.push(ChartRecord {
                ts_ms: point.timestamp.and_utc().timestamp_millis(),
                time: point.timestamp.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                values,
            });
        }
        self.records = records;
        Ok(())
    }
}

/// Visible time-domain window of a chart, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// The records inside the window. `records` must be time-sorted.
    pub fn select<'r>(&self, records: &'r [ChartRecord]) -> &'r [ChartRecord] {
        let start_ms = self.start.and_utc().timestamp_millis();
        let end_ms = self.end.and_utc().timestamp_millis();
        let lo = records.partition_point(|r| r.ts_ms < start_ms);
        let hi = records.partition_point(|r| r.ts_ms <= end_ms);
        &records[lo..hi.max(lo)]
    }
}

/// A brushed index range and the timestamps at its ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrushSelection {
    pub start_index: usize,
    pub end_index: usize,
    pub start_value: i64,
    pub end_value: i64,
}

impl BrushSelection {
    /// Build a selection from raw gesture indices, clamping both to the data
    /// bounds first. `None` when there are no records.
    pub fn clamped(records: &[ChartRecord], start: i64, end: i64) -> Option<Self> {
        let last = records.len().checked_sub(1)?;
        let clamp = |index: i64| -> usize {
            if index <= 0 {
                0
            } else {
                usize::try_from(index).map_or(last, |i| i.min(last))
            }
        };
        let (start_index, end_index) = (clamp(start), clamp(end));
        Some(Self {
            start_index,
            end_index,
            start_value: records[start_index].ts_ms,
            end_value: records[end_index].ts_ms,
        })
    }
}

/// Everything a chart needs for one finished run.
#[derive(Debug, Serialize)]
pub struct ChartDocument {
    pub chart_kind: ChartKind,
    pub window: Option<TimeWindow>,
    pub signals: Vec<Signal>,
    pub groups: Vec<SignalGroup>,
    pub points: Vec<DataPoint>,
    pub string_values: StringValueMap,
    pub records: Vec<ChartRecord>,
}

impl ChartDocument {
    pub fn new(
        chart_kind: ChartKind,
        signals: Vec<Signal>,
        groups: Vec<SignalGroup>,
        run: Option<FinalizedRun>,
        records: Vec<ChartRecord>,
    ) -> Self {
        let (points, string_values) = run
            .map(|run| (run.points, run.string_values))
            .unwrap_or_default();
        let window = match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some(TimeWindow {
                start: first.timestamp,
                end: last.timestamp,
            }),
            _ => None,
        };
        Self {
            chart_kind,
            window,
            signals,
            groups,
            points,
            string_values,
            records,
        }
    }
}

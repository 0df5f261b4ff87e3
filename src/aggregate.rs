//! Forward-fill aggregation across the whole run.
//!
//! The aggregator remembers the last value seen for every signal, across chunk
//! boundaries, and turns lines with at least one fresh value into
//! [`DataPoint`]s. Lines with only carried-over values are dropped.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::extract::FreshValue;
use crate::series::{DataPoint, Value};

/// Accumulated extraction results for one run, in line order.
#[derive(Debug, Default)]
pub struct ForwardFillAggregator {
    points: Vec<DataPoint>,
    last_seen: BTreeMap<String, Value>,
    string_values: BTreeMap<String, BTreeSet<String>>,
}

impl ForwardFillAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fresh values of one timestamped line.
    ///
    /// Returns true if a data point was emitted.
    pub fn record_line(&mut self, timestamp: NaiveDateTime, fresh: Vec<FreshValue>) -> bool {
        if fresh.is_empty() {
            return false;
        }

        let mut values = BTreeMap::new();
        for FreshValue { signal, value } in fresh {
            if let Value::Text(text) = &value {
                self.string_values
                    .entry(signal.clone())
                    .or_default()
                    .insert(text.clone());
            }
            self.last_seen.insert(signal.clone(), value.clone());
            values.insert(signal, value);
        }

        for (signal, value) in &self.last_seen {
            if !values.contains_key(signal) {
                values.insert(signal.clone(), value.clone());
            }
        }

        self.points.push(DataPoint { timestamp, values });
        true
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[cfg(test)]
    pub fn last_seen(&self, signal: &str) -> Option<&Value> {
        self.last_seen.get(signal)
    }

    /// Consume the aggregator, returning points in line order and the distinct
    /// string values observed per signal.
    pub fn into_parts(self) -> (Vec<DataPoint>, BTreeMap<String, BTreeSet<String>>) {
        (self.points, self.string_values)
    }
}

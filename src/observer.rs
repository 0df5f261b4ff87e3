//! Status and chart-state side channel.
//!
//! The pipeline never talks to a UI directly. Everything it wants to show, from
//! the signal list at run start to progress messages and the final points, goes
//! through the [`RunObserver`] trait. [`ChartState`] is the in-memory
//! implementation used by the command line front end and by tests.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::series::{DataPoint, Signal, SignalGroup, StringValueMap};

/// A status line emitted by the scheduler or the finalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// A chunk finished. `chunk` is 1-based.
    Chunk {
        chunk: usize,
        total: usize,
        percent: u8,
    },
    /// All chunks are done; sorting and encoding is next.
    Finalizing { points: usize },
    /// Finalization succeeded.
    Extracted { points: usize },
    /// A large result set is about to be handed to the formatter.
    Formatting { points: usize },
    /// The formatter is still running on a large result set.
    Heartbeat { points: usize, elapsed: Duration },
    /// The run produced no data points.
    NoData,
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusUpdate::Chunk {
                chunk,
                total,
                percent,
            } => write!(f, "chunk {chunk} of {total}, {percent}%"),
            StatusUpdate::Finalizing { points } => write!(f, "finalizing {points} points"),
            StatusUpdate::Extracted { points } => write!(f, "extracted {points} points"),
            StatusUpdate::Formatting { points } => write!(f, "formatting {points} points"),
            StatusUpdate::Heartbeat { points, elapsed } => write!(
                f,
                "formatting {points} points (still working, {}s)",
                elapsed.as_secs()
            ),
            StatusUpdate::NoData => write!(f, "no data"),
        }
    }
}

/// Receiver for everything a run publishes.
///
/// Methods take `&self` and the trait requires `Sync`: the heartbeat for large
/// formatting hand-offs calls [`RunObserver::status`] from its timer thread.
pub trait RunObserver: Sync {
    /// Drop all chart state from a previous run.
    fn reset(&self);

    /// Publish the signal list and panel grouping for the new run.
    fn publish_signals(&self, signals: &[Signal], groups: &[SignalGroup]);

    /// Toggle the "processing" flag.
    fn set_processing(&self, processing: bool);

    /// Show a status line.
    fn status(&self, update: &StatusUpdate);

    /// Remove the current status line.
    fn clear_status(&self);

    /// Informational notification (progress milestones).
    fn notify(&self, message: &str);

    /// User-visible error notification.
    fn notify_error(&self, message: &str);

    /// Publish the finalized, time-sorted points and categorical codes.
    fn publish_result(&self, points: &[DataPoint], string_values: &StringValueMap);
}

#[derive(Debug, Default)]
struct ChartInner {
    signals: Vec<Signal>,
    groups: Vec<SignalGroup>,
    points: Vec<DataPoint>,
    string_values: StringValueMap,
    processing: bool,
    status: Option<String>,
    status_history: Vec<StatusUpdate>,
    notifications: Vec<String>,
    errors: Vec<String>,
}

/// In-memory chart-facing state.
#[derive(Debug, Default)]
pub struct ChartState {
    inner: Mutex<ChartInner>,
}

impl ChartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, ChartInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.inner().signals.clone()
    }

    pub fn groups(&self) -> Vec<SignalGroup> {
        self.inner().groups.clone()
    }

    pub fn points(&self) -> Vec<DataPoint> {
        self.inner().points.clone()
    }

    pub fn string_values(&self) -> StringValueMap {
        self.inner().string_values.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.inner().processing
    }

    /// The status line currently shown, if any.
    pub fn status_line(&self) -> Option<String> {
        self.inner().status.clone()
    }

    pub fn status_history(&self) -> Vec<StatusUpdate> {
        self.inner().status_history.clone()
    }

    /// Percentages of every chunk progress report, in order.
    pub fn progress_history(&self) -> Vec<u8> {
        self.inner()
            .status_history
            .iter()
            .filter_map(|update| match update {
                StatusUpdate::Chunk { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.inner().notifications.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.inner().errors.clone()
    }

    /// Show or hide a signal. Returns false if no signal has that name.
    pub fn set_visible(&self, name: &str, visible: bool) -> bool {
        let mut inner = self.inner();
        match inner.signals.iter_mut().find(|s| s.name == name) {
            Some(signal) => {
                signal.visible = visible;
                true
            }
            None => false,
        }
    }
}

impl RunObserver for ChartState {
    fn reset(&self) {
        let mut inner = self.inner();
        inner.signals.clear();
        inner.groups.clear();
        inner.points.clear();
        inner.string_values.clear();
    }

    fn publish_signals(&self, signals: &[Signal], groups: &[SignalGroup]) {
        let mut inner = self.inner();
        inner.signals = signals.to_vec();
        inner.groups = groups.to_vec();
    }

    fn set_processing(&self, processing: bool) {
        self.inner().processing = processing;
    }

    fn status(&self, update: &StatusUpdate) {
        let mut inner = self.inner();
        inner.status = Some(update.to_string());
        inner.status_history.push(update.clone());
    }

    fn clear_status(&self) {
        self.inner().status = None;
    }

    fn notify(&self, message: &str) {
        self.inner().notifications.push(message.to_string());
    }

    fn notify_error(&self, message: &str) {
        self.inner().errors.push(message.to_string());
    }

    fn publish_result(&self, points: &[DataPoint], string_values: &StringValueMap) {
        let mut inner = self.inner();
        inner.points = points.to_vec();
        inner.string_values = string_values.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Pattern;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_status_strings() {
        let chunk = StatusUpdate::Chunk {
            chunk: 3,
            total: 4,
            percent: 75,
        };
        assert_eq!(chunk.to_string(), "chunk 3 of 4, 75%");
        assert_eq!(StatusUpdate::NoData.to_string(), "no data");
        let heartbeat = StatusUpdate::Heartbeat {
            points: 10,
            elapsed: Duration::from_millis(4500),
        };
        assert_eq!(
            heartbeat.to_string(),
            "formatting 10 points (still working, 4s)"
        );
    }

    #[test]
    fn test_reset_clears_chart_but_not_history() {
        let state = ChartState::new();
        let mut rng = StepRng::new(0, 1);
        let signals = Signal::from_patterns(&[Pattern::new("a", "(a)")], &mut rng);
        state.publish_signals(&signals, &[SignalGroup::default_for(&signals)]);
        state.status(&StatusUpdate::NoData);
        state.reset();

        assert!(state.signals().is_empty());
        assert!(state.groups().is_empty());
        assert_eq!(state.status_history(), vec![StatusUpdate::NoData]);
    }

    #[test]
    fn test_set_visible() {
        let state = ChartState::new();
        let mut rng = StepRng::new(0, 1);
        let signals = Signal::from_patterns(&[Pattern::new("a", "(a)")], &mut rng);
        state.publish_signals(&signals, &[]);

        assert!(state.set_visible("a", false));
        assert!(!state.signals()[0].visible);
        assert!(!state.set_visible("missing", false));
    }

    #[test]
    fn test_clear_status() {
        let state = ChartState::new();
        state.status(&StatusUpdate::Finalizing { points: 3 });
        assert_eq!(state.status_line().as_deref(), Some("finalizing 3 points"));
        state.clear_status();
        assert!(state.status_line().is_none());
    }
}

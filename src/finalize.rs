//! Chronological finalization and the formatting hand-off.
//!
//! Once every chunk is processed the accumulated points are stably sorted by
//! timestamp and the categorical map is built. The result then goes to a
//! [`Formatter`], either directly or, for large result sets, while a heartbeat
//! thread keeps the status line alive.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::aggregate::ForwardFillAggregator;
use crate::encode::encode_categories;
use crate::observer::{RunObserver, StatusUpdate};
use crate::series::{DataPoint, StringValueMap};

/// Turns finalized points into renderer-ready records.
///
/// Implementations publish their output through their own side channel; the
/// pipeline only cares whether formatting succeeded.
pub trait Formatter {
    fn format(&mut self, points: &[DataPoint], string_values: &StringValueMap) -> Result<()>;
}

/// The time-sorted result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedRun {
    pub points: Vec<DataPoint>,
    pub string_values: StringValueMap,
}

impl FinalizedRun {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Sort the accumulated points and build the categorical map.
///
/// Returns `None` when the run emitted no points at all.
pub fn finalize(aggregator: ForwardFillAggregator) -> Option<FinalizedRun> {
    let (mut points, string_values) = aggregator.into_parts();
    if points.is_empty() {
        return None;
    }
    // sort_by_key is stable: equal timestamps keep line order.
    points.sort_by_key(|point| point.timestamp);
    Some(FinalizedRun {
        points,
        string_values: encode_categories(&string_values),
    })
}

/// Run `f`, turning a panic into an error.
pub(crate) fn catch_failure<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow!("panicked: {message}"))
        }
    }
}

/// Hand the run to the formatter with no extra scheduling.
pub fn format_direct(run: &FinalizedRun, formatter: &mut dyn Formatter) -> Result<()> {
    catch_failure(|| formatter.format(&run.points, &run.string_values))
}

/// Hand the run to the formatter while a heartbeat reports liveness.
///
/// The heartbeat emits [`StatusUpdate::Heartbeat`] every `interval` until the
/// formatter returns, fails or panics. It is always stopped and joined before
/// this function returns.
pub fn format_with_heartbeat(
    run: &FinalizedRun,
    formatter: &mut dyn Formatter,
    observer: &dyn RunObserver,
    interval: Duration,
) -> Result<()> {
    let points = run.len();
    thread::scope(|s| {
        let (stop_tx, stop_rx) = channel::<()>();
        s.spawn(move || {
            let started = Instant::now();
            while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
                observer.status(&StatusUpdate::Heartbeat {
                    points,
                    elapsed: started.elapsed(),
                });
            }
        });

        let result = format_direct(run, formatter);
        // Disconnects the heartbeat; the scope joins it.
        drop(stop_tx);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FreshValue;
    use crate::observer::ChartState;
    use crate::series::Value;
    use anyhow::bail;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, sec)
            .unwrap()
    }

    fn fresh(signal: &str, value: Value) -> Vec<FreshValue> {
        vec![FreshValue {
            signal: signal.to_string(),
            value,
        }]
    }

    struct SlowFormatter {
        delay: Duration,
        fail: bool,
    }

    impl Formatter for SlowFormatter {
        fn format(&mut self, _: &[DataPoint], _: &StringValueMap) -> Result<()> {
            thread::sleep(self.delay);
            if self.fail {
                bail!("formatter gave up");
            }
            Ok(())
        }
    }

    struct PanickingFormatter;

    impl Formatter for PanickingFormatter {
        fn format(&mut self, _: &[DataPoint], _: &StringValueMap) -> Result<()> {
            panic!("boom");
        }
    }

    fn sample_run() -> FinalizedRun {
        let mut agg = ForwardFillAggregator::new();
        agg.record_line(ts(0), fresh("a", Value::Number(1.0)));
        finalize(agg).unwrap()
    }

    fn heartbeat_count(state: &ChartState) -> usize {
        state
            .status_history()
            .iter()
            .filter(|u| matches!(u, StatusUpdate::Heartbeat { .. }))
            .count()
    }

    #[test]
    fn test_finalize_empty_is_none() {
        assert!(finalize(ForwardFillAggregator::new()).is_none());
    }

    #[test]
    fn test_finalize_sorts_stably() {
        let mut agg = ForwardFillAggregator::new();
        agg.record_line(ts(5), fresh("a", Value::Number(1.0)));
        agg.record_line(ts(1), fresh("a", Value::Number(2.0)));
        agg.record_line(ts(5), fresh("a", Value::Number(3.0)));
        agg.record_line(ts(3), fresh("s", Value::Text("x".into())));

        let run = finalize(agg).unwrap();
        let order: Vec<(NaiveDateTime, Option<&Value>)> = run
            .points
            .iter()
            .map(|p| (p.timestamp, p.values.get("a")))
            .collect();
        assert_eq!(
            order,
            vec![
                (ts(1), Some(&Value::Number(2.0))),
                (ts(3), Some(&Value::Number(2.0))),
                (ts(5), Some(&Value::Number(1.0))),
                (ts(5), Some(&Value::Number(3.0))),
            ]
        );
        assert_eq!(run.string_values["s"]["x"], 1);
    }

    #[test]
    fn test_catch_failure_converts_panic() {
        let result: Result<()> = catch_failure(|| panic!("bad state"));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("bad state"));
    }

    #[test]
    fn test_format_direct_panic_is_error() {
        let run = sample_run();
        assert!(format_direct(&run, &mut PanickingFormatter).is_err());
    }

    #[test]
    fn test_heartbeat_fires_while_formatting() {
        let run = sample_run();
        let state = ChartState::new();
        let mut formatter = SlowFormatter {
            delay: Duration::from_millis(200),
            fail: false,
        };
        format_with_heartbeat(&run, &mut formatter, &state, Duration::from_millis(20)).unwrap();
        assert!(heartbeat_count(&state) >= 1);
    }

    #[test]
    fn test_heartbeat_stops_on_failure() {
        let run = sample_run();
        let state = ChartState::new();
        let mut formatter = SlowFormatter {
            delay: Duration::from_millis(60),
            fail: true,
        };
        let interval = Duration::from_millis(10);
        let result = format_with_heartbeat(&run, &mut formatter, &state, interval);
        assert!(result.is_err());

        let after = heartbeat_count(&state);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(heartbeat_count(&state), after);
    }

    #[test]
    fn test_heartbeat_stops_on_panic() {
        let run = sample_run();
        let state = ChartState::new();
        let interval = Duration::from_millis(5);
        let result = format_with_heartbeat(&run, &mut PanickingFormatter, &state, interval);
        assert!(result.is_err());

        let after = heartbeat_count(&state);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(heartbeat_count(&state), after);
    }
}

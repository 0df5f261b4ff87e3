//! Shared constants for log extraction.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// Static regex for the line-initial timestamp. Compiled once at first use.
/// Pattern: YYYY/MM/DD HH:MM:SS.ffffff (six fractional digits, microseconds).
/// ASCII digits only; `\d` would also accept other Unicode decimal digits.
pub static TIMESTAMP_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})/([0-9]{2})/([0-9]{2}) ([0-9]{2}):([0-9]{2}):([0-9]{2})\.([0-9]{6})")
        .expect("Invalid timestamp prefix regex pattern")
});

/// Display colors assigned to signals in pattern order, wrapping around.
pub const SIGNAL_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Name of the single panel every signal is placed into at run start.
pub const DEFAULT_GROUP_NAME: &str = "Signals";

/// Number of log lines processed per scheduler tick.
pub const DEFAULT_CHUNK_SIZE: usize = 5_000;

/// Point count above which formatting is handed off with a delay and heartbeat.
pub const LARGE_DATASET_THRESHOLD: usize = 50_000;

/// Pause before a large formatting hand-off so the "formatting" status is visible.
pub const FORMAT_HANDOFF_DELAY: Duration = Duration::from_millis(50);

/// Interval between heartbeat status updates while a large format is running.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

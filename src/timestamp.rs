//! Line-initial timestamp recognition.
//!
//! Log lines start with `YYYY/MM/DD HH:MM:SS.ffffff`. The prefix is rewritten to
//! `YYYY-MM-DDTHH:MM:SS.mmm` (fraction truncated to milliseconds) and parsed
//! into a [`NaiveDateTime`]. Lines without the prefix, or whose prefix is not a
//! real calendar instant, yield `None` and are skipped by the caller.

use chrono::NaiveDateTime;

use crate::series::TIMESTAMP_PREFIX_RE;

const NORMALIZED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Rewrite a recognized timestamp prefix into its normalized text form.
pub fn normalize_prefix(line: &str) -> Option<String> {
    let caps = TIMESTAMP_PREFIX_RE.captures(line)?;
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let millis = field(7).get(..3)?;
    Some(format!(
        "{}-{}-{}T{}:{}:{}.{}",
        field(1),
        field(2),
        field(3),
        field(4),
        field(5),
        field(6),
        millis
    ))
}

/// Parse the timestamp at the start of `line`.
pub fn parse_line_timestamp(line: &str) -> Option<NaiveDateTime> {
    let normalized = normalize_prefix(line)?;
    NaiveDateTime::parse_from_str(&normalized, NORMALIZED_FORMAT).ok()
}

//! Per-line signal extraction.
//!
//! Every pattern is applied to a line on its own. A pattern that cannot run
//! (bad regex, no capture group) contributes nothing and never affects the
//! other patterns on the line.

use anyhow::Result;

use crate::pattern::{compile_all, CompiledPattern};
use crate::series::{Pattern, Value};

/// A value captured on the current line, before forward fill.
#[derive(Clone, Debug, PartialEq)]
pub struct FreshValue {
    pub signal: String,
    pub value: Value,
}

/// Applies the run's compiled patterns to log lines.
#[derive(Debug)]
pub struct SignalExtractor {
    patterns: Vec<CompiledPattern>,
}

impl SignalExtractor {
    /// Compile every pattern once for the run. Unusable patterns are logged
    /// here, once, and then silently produce no matches.
    pub fn new(patterns: &[Pattern]) -> Result<Self> {
        let patterns = compile_all(patterns)?;
        for pattern in &patterns {
            if let Some(err) = pattern.error() {
                tracing::warn!("Pattern disabled for this run: {}", err);
            }
        }
        Ok(Self { patterns })
    }

    /// Fresh values on `line`, in pattern order.
    pub fn extract(&self, line: &str) -> Vec<FreshValue> {
        let mut fresh = Vec::new();
        for pattern in &self.patterns {
            match pattern.capture(line) {
                Ok(Some(text)) => fresh.push(FreshValue {
                    signal: pattern.name().to_string(),
                    value: Value::coerce(text),
                }),
                Ok(None) => {}
                // Reported when compiled; a failing pattern is just a miss.
                Err(_) => {}
            }
        }
        fresh
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn failed_patterns(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter().filter(|p| p.error().is_some())
    }
}

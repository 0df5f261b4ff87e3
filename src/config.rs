//! Pipeline configuration.

use std::time::Duration;

use anyhow::{bail, Result};

use crate::series::{
    DEFAULT_CHUNK_SIZE, FORMAT_HANDOFF_DELAY, HEARTBEAT_INTERVAL, LARGE_DATASET_THRESHOLD,
};

/// Tunables for a run. None of them change the extracted data; they only
/// affect scheduling granularity and how large results are handed off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Log lines processed per scheduler tick.
    pub chunk_size: usize,

    /// Point count above which formatting is deferred by `handoff_delay` and
    /// watched by a heartbeat.
    pub large_dataset_threshold: usize,

    /// Pause requested from the host before a large formatting hand-off.
    pub handoff_delay: Duration,

    /// Interval between heartbeat status updates during a large format.
    pub heartbeat_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            large_dataset_threshold: LARGE_DATASET_THRESHOLD,
            handoff_delay: FORMAT_HANDOFF_DELAY,
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }
}

impl PipelineConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("Chunk size must be at least 1");
        }
        if self.heartbeat_interval.is_zero() {
            bail!("Heartbeat interval must be non-zero");
        }
        Ok(())
    }
}

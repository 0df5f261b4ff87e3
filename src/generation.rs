//! Run generation counter.
//!
//! Starting a new run while an older one is still being driven is not
//! supported by the pipeline itself. The generation counter makes that case
//! harmless: every run holds a [`RunToken`], and beginning a newer run turns
//! all older tokens stale so their schedulers stop at the next tick without
//! publishing anything.
//!
//! # Thread Safety
//!
//! The counter is an `AtomicU64` behind an `Arc`, so tokens can be checked
//! from any thread. Relaxed ordering is sufficient: only the latest value
//! matters, not ordering with other memory.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of run tokens for one chart.
#[derive(Debug, Clone, Default)]
pub struct RunGeneration {
    current: Arc<AtomicU64>,
}

/// Identifies one run; stale once a newer run begins.
#[derive(Debug, Clone)]
pub struct RunToken {
    current: Arc<AtomicU64>,
    id: u64,
}

impl RunGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new run, superseding every earlier token.
    pub fn begin(&self) -> RunToken {
        let id = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        RunToken {
            current: Arc::clone(&self.current),
            id,
        }
    }

    /// Id of the newest run, 0 before any run began.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }
}

impl RunToken {
    /// A token for a run nobody else can supersede.
    pub fn detached() -> Self {
        RunGeneration::new().begin()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Relaxed) == self.id
    }
}

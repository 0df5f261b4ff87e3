//! Shared time-series data types.
//!
//! This module provides the canonical data types produced by the extraction
//! pipeline and consumed by the chart-facing collaborators. By sharing these
//! types, the scheduler, the finalizer and the formatters agree on one shape
//! for signals, data points and categorical codes.
//!
//! # Module Organization
//!
//! - [`models`]: Signal, value and data point structs
//! - [`constants`]: Shared constants (timestamp regex, color palette, defaults)

pub mod constants;
pub mod models;

// Re-export commonly used types
pub use constants::*;
pub use models::*;

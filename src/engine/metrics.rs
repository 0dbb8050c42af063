//! Search run metrics.
//!
//! Cheap counters collected on every run. They cost a few integer increments,
//! so there is no separate "fast" path without them.
//!
//! - `steps` counts loop iterations of the narrowing cursor.
//! - `carries` counts how often the cursor jumped forward (or back) because a
//!   field had no allowed value left at its current position.
//! - `skipped_local_times` counts candidates that had every field right but
//!   did not exist as a local time (DST gap) or fell on the wrong side of the
//!   start in a DST fold.

use crate::error::Result;
use chrono::{DateTime, TimeZone};
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchMetrics {
    /// Wall time spent in the search.
    pub elapsed: Duration,
    pub steps: usize,
    pub carries: usize,
    pub skipped_local_times: usize,
}

/// Search output bundled with its metrics.
#[derive(Debug, Clone)]
pub struct SearchRun<Tz: TimeZone> {
    pub result: Result<DateTime<Tz>>,
    pub metrics: SearchMetrics,
}

//! Search engine.
//!
//! Given a parsed predicate list, a start instant and a timezone, the engine
//! finds the earliest (or, searching backwards, the latest) second that
//! satisfies every predicate.
//!
//! ## How the parts work together
//!
//! ```text
//! Vec<Predicate> ── Constraints::from_predicates ──┐      (fields.rs)
//!                                                  │
//!                 one allowed-value set per field  │
//!                                                  v
//! start ─▶ local cursor ─▶ Search::run ── narrow ─┬─ Moved   (carry, re-descend)
//!                           (search.rs)           ├─ Candidate ─▶ localize in tz
//!                                                 └─ Exhausted
//!                                                  │
//!                                                  v
//!                                       DateTime<Tz> + SearchMetrics
//! ```
//!
//! Narrowing works field by field, coarse to fine (year, month, day, hour,
//! minute, second), the same way a cron "next fire time" computation does:
//! if a field has an allowed value at or after the cursor's current value, the
//! cursor jumps there and every finer field is reset to its minimum; if not,
//! the next coarser field is carried. The cursor only ever moves in one
//! direction, so each rejected position is never looked at again.
//!
//! Cursor arithmetic (calendar.rs) is done on local wall-clock time; the
//! timezone is consulted only when a candidate is found.
//!
//! ## Responsibilities by module
//!
//! - `fields.rs`: folds predicates into per-field sets (`Constraints`).
//! - `calendar.rs`: wall-clock cursor moves (start of next month, end of
//!   previous day, and so on) plus the search window arithmetic.
//! - `search.rs`: the narrowing loop, the timestamp shortcut and candidate
//!   filtering.
//! - `metrics.rs`: counters reported by verbose runs.
//!
//! ## Debugging
//!
//! Run with `RUST_LOG=timespec=trace` to see every cursor move.

#[path = "engine/calendar.rs"]
mod calendar;
#[path = "engine/fields.rs"]
mod fields;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/search.rs"]
mod search;

pub use fields::FieldMask;
pub(crate) use fields::Constraints;
pub use metrics::{SearchMetrics, SearchRun};
pub(crate) use search::Search;

/// How far from the start instant the search is willing to go.
pub const WINDOW_YEARS: i32 = 10;

//! Compact timespecs: "next 5am on a Monday" without cron.
//!
//! A timespec is a whitespace-separated list of predicates, all of which must
//! hold:
//!
//! ```text
//! 2024-01-05     that calendar date
//! 05:30, ::0     time of day, empty parts are wildcards
//! mon .. sun     day of week
//! 15m, 6h, 5d    second/minute/hour/day-of-month divisible by n
//! 1700000000     exactly that POSIX timestamp
//! ```
//!
//! [`resolve`] parses a timespec and finds the first instant at or after the
//! [`Context`] start (or the last one at or before it, for a reversed context)
//! that satisfies every predicate, looking at most [`WINDOW_YEARS`] years away.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use timespec::{Context, resolve};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
//! let found = resolve("mon 05:", &Context::at(start)).unwrap();
//! assert_eq!(found, Utc.with_ymd_and_hms(2024, 1, 8, 5, 0, 0).unwrap());
//! ```

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod parser;
mod predicate;

pub use api::{Context, Direction, SearchDetails, TimespecQuery, parse, parse_with, resolve, resolve_verbose};
pub use engine::{FieldMask, SearchMetrics, SearchRun, WINDOW_YEARS};
pub use error::{Error, ParseError, Result};
pub use predicate::{Predicate, Unit};

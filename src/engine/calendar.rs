//! Local wall-clock arithmetic for the search cursor.
//!
//! All helpers work on `NaiveDateTime` (no timezone, no DST) and return `None`
//! only when the result would leave chrono's representable range.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Same wall time `years` later (or earlier); Feb 29 falls back to Feb 28.
pub(crate) fn add_years(dt: NaiveDateTime, years: i32) -> Option<NaiveDateTime> {
    let year = dt.year().checked_add(years)?;
    let date = NaiveDate::from_ymd_opt(year, dt.month(), dt.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, dt.month(), 28))?;
    Some(date.and_time(dt.time()))
}

fn start_of(date: NaiveDate, hour: u32, minute: u32, second: u32) -> Option<NaiveDateTime> {
    date.and_hms_opt(hour, minute, second)
}

pub(crate) fn start_of_year(year: i32) -> Option<NaiveDateTime> {
    start_of(NaiveDate::from_ymd_opt(year, 1, 1)?, 0, 0, 0)
}

pub(crate) fn end_of_year(year: i32) -> Option<NaiveDateTime> {
    start_of(NaiveDate::from_ymd_opt(year, 12, 31)?, 23, 59, 59)
}

pub(crate) fn start_of_month(year: i32, month: u32) -> Option<NaiveDateTime> {
    start_of(NaiveDate::from_ymd_opt(year, month, 1)?, 0, 0, 0)
}

pub(crate) fn end_of_month(year: i32, month: u32) -> Option<NaiveDateTime> {
    start_of(NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?, 23, 59, 59)
}

pub(crate) fn start_of_next_month(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    match dt.month() {
        12 => start_of_year(dt.year().checked_add(1)?),
        m => start_of_month(dt.year(), m + 1),
    }
}

pub(crate) fn end_of_prev_month(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    match dt.month() {
        1 => end_of_year(dt.year().checked_sub(1)?),
        m => end_of_month(dt.year(), m - 1),
    }
}

pub(crate) fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub(crate) fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    start_of(date, 23, 59, 59)
}

pub(crate) fn start_of_next_day(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    Some(start_of_day(dt.date().succ_opt()?))
}

pub(crate) fn end_of_prev_day(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    end_of_day(dt.date().pred_opt()?)
}

fn truncate_to_hour(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    start_of(dt.date(), dt.hour(), 0, 0)
}

fn truncate_to_minute(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    start_of(dt.date(), dt.hour(), dt.minute(), 0)
}

pub(crate) fn start_of_next_hour(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    truncate_to_hour(dt)?.checked_add_signed(Duration::hours(1))
}

pub(crate) fn end_of_prev_hour(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    truncate_to_hour(dt)?.checked_sub_signed(Duration::seconds(1))
}

pub(crate) fn start_of_next_minute(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    truncate_to_minute(dt)?.checked_add_signed(Duration::minutes(1))
}

pub(crate) fn end_of_prev_minute(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    truncate_to_minute(dt)?.checked_sub_signed(Duration::seconds(1))
}

pub(crate) fn with_time(dt: NaiveDateTime, hour: u32, minute: u32, second: u32) -> Option<NaiveDateTime> {
    start_of(dt.date(), hour, minute, second)
}

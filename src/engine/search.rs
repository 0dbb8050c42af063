//! The narrowing search.
//!
//! A single cursor walks local wall-clock time in one direction. Each
//! iteration looks at the fields coarse to fine and either:
//!
//! ```text
//! field value allowed          -> look at the next finer field
//! later value allowed          -> jump there, finer fields to their minimum
//! nothing allowed from here    -> carry into the next coarser field
//! ```
//!
//! Backwards it is the mirror image: jump to the largest allowed value at or
//! before the cursor, finer fields go to their maximum, and an empty field
//! borrows from the coarser one.
//!
//! Once every field is allowed, the cursor is turned into an instant in the
//! query's timezone:
//!
//! - A wall time inside a DST gap does not exist and is skipped.
//! - A wall time inside a DST fold maps to two instants. Forwards the earlier
//!   one that is not before the start wins, backwards the later one that is not
//!   after the start.
//! - If the start itself lies inside a fold, the wall times the cursor has
//!   already passed come round again on the start side. A second, short walk
//!   over the fold covers them and the closer of the two matches wins.
//!
//! Every candidate is checked against the original predicates before it is
//! returned.

use std::time::Instant;

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use super::WINDOW_YEARS;
use super::calendar;
use super::fields::Constraints;
use super::metrics::{SearchMetrics, SearchRun};
use crate::Direction;
use crate::error::{Error, Result};
use crate::predicate::Predicate;

/// Outcome of one narrowing pass over the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Every field of the cursor is allowed.
    Candidate,
    /// The cursor moved; narrowing restarts from the year.
    Moved(NaiveDateTime, &'static str),
    /// No allowed value is reachable in this direction.
    Exhausted,
}

fn moved(next: Option<NaiveDateTime>, field: &'static str) -> Step {
    next.map_or(Step::Exhausted, |dt| Step::Moved(dt, field))
}

pub(crate) struct Search<'a, Tz: TimeZone> {
    predicates: &'a [Predicate],
    constraints: Constraints,
    start: DateTime<Utc>,
    tz: &'a Tz,
    direction: Direction,
}

impl<'a, Tz: TimeZone> Search<'a, Tz> {
    pub fn new(predicates: &'a [Predicate], start: DateTime<Utc>, tz: &'a Tz, direction: Direction) -> Self {
        Self { predicates, constraints: Constraints::from_predicates(predicates), start, tz, direction }
    }

    /// Find the first matching instant and report how much work it took.
    pub fn run(&self) -> SearchRun<Tz> {
        let started = Instant::now();
        let mut metrics = SearchMetrics::default();

        log::debug!(
            "[search] start={} direction={:?} fields={:?}",
            self.start,
            self.direction,
            self.constraints.mask.labels()
        );

        let result = self.search(&mut metrics);
        metrics.elapsed = started.elapsed();

        match &result {
            Ok(found) => log::debug!("[search] found={:?} steps={}", found, metrics.steps),
            Err(err) => log::debug!("[search] {} steps={}", err, metrics.steps),
        }

        SearchRun { result, metrics }
    }

    /// Return the first of `candidates` (in search order) that satisfies every predicate.
    ///
    /// The start instant and the search window do not apply here: the candidate
    /// list is the search space.
    pub fn first_candidate(&self, mut candidates: Vec<DateTime<Utc>>) -> Result<DateTime<Tz>> {
        candidates.sort();
        if self.direction == Direction::Backward {
            candidates.reverse();
        }
        let first = *candidates.first().ok_or(Error::EmptyCandidates)?;

        candidates
            .into_iter()
            .map(|candidate| candidate.with_timezone(self.tz))
            .find(|candidate| self.satisfies_all(candidate))
            .ok_or(Error::NoMatchWithinWindow { start: first })
    }

    fn no_match(&self) -> Error {
        Error::NoMatchWithinWindow { start: self.start }
    }

    fn satisfies_all(&self, date_time: &DateTime<Tz>) -> bool {
        self.predicates.iter().all(|p| p.matches(date_time))
    }

    fn on_start_side(&self, instant: DateTime<Utc>) -> bool {
        match self.direction {
            Direction::Forward => instant >= self.start,
            Direction::Backward => instant <= self.start,
        }
    }

    fn window_limit(&self, local_start: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.direction {
            Direction::Forward => calendar::add_years(local_start, WINDOW_YEARS),
            Direction::Backward => calendar::add_years(local_start, -WINDOW_YEARS),
        }
    }

    fn beyond(&self, cursor: NaiveDateTime, limit: Option<NaiveDateTime>) -> bool {
        match (self.direction, limit) {
            (_, None) => false,
            (Direction::Forward, Some(limit)) => cursor > limit,
            (Direction::Backward, Some(limit)) => cursor < limit,
        }
    }

    fn search(&self, metrics: &mut SearchMetrics) -> Result<DateTime<Tz>> {
        if !self.constraints.is_satisfiable() {
            log::debug!("[search] some field has no allowed value");
            return Err(self.no_match());
        }

        let local_start = self.start.with_timezone(self.tz).naive_local();
        let limit = self.window_limit(local_start);

        if let Some(&epoch_seconds) = self.constraints.timestamps.first() {
            return self.search_timestamp(epoch_seconds, limit);
        }

        let cursor = self.whole_second(local_start).ok_or_else(|| self.no_match())?;

        let found = self.walk(cursor, limit, metrics, |c| self.localize(c));
        let repeated = self.search_fold(cursor, metrics);

        match (found, repeated) {
            (Some(found), Some(repeated)) => Ok(self.closer(found, repeated)),
            (found, repeated) => found.or(repeated).ok_or_else(|| self.no_match()),
        }
    }

    /// Narrow from `cursor` until a local time passes `localize` and every predicate.
    fn walk(
        &self,
        mut cursor: NaiveDateTime,
        limit: Option<NaiveDateTime>,
        metrics: &mut SearchMetrics,
        localize: impl Fn(NaiveDateTime) -> Option<DateTime<Tz>>,
    ) -> Option<DateTime<Tz>> {
        loop {
            metrics.steps += 1;
            if self.beyond(cursor, limit) {
                return None;
            }

            let step = match self.direction {
                Direction::Forward => self.narrow_forward(cursor),
                Direction::Backward => self.narrow_backward(cursor),
            };

            match step {
                Step::Exhausted => return None,
                Step::Moved(next, field) => {
                    log::trace!("[search] carry {field}: {cursor} -> {next}");
                    metrics.carries += 1;
                    cursor = next;
                }
                Step::Candidate => {
                    match localize(cursor) {
                        Some(found) if self.satisfies_all(&found) => return Some(found),
                        Some(found) => {
                            log::warn!("[search] candidate {found:?} failed re-validation, skipping");
                        }
                        None => {
                            log::trace!("[search] local time {cursor} skipped");
                            metrics.skipped_local_times += 1;
                        }
                    }
                    cursor = self.nudge(cursor)?;
                }
            }
        }
    }

    /// Search the other pass of a DST fold the start lies in.
    ///
    /// Starting in the first pass of a repeated hour going forward, wall times
    /// before the start come round again at the later offset. The main walk
    /// never steps back in wall time, so they are searched here, bounded to one
    /// fold length either side of the start. Backwards the same holds for the
    /// first pass seen from the second.
    fn search_fold(&self, cursor: NaiveDateTime, metrics: &mut SearchMetrics) -> Option<DateTime<Tz>> {
        let LocalResult::Ambiguous(a, b) = self.tz.from_local_datetime(&cursor) else {
            return None;
        };
        let fold = chrono::Duration::seconds((a.timestamp() - b.timestamp()).abs());

        let (from, limit) = match self.direction {
            Direction::Forward => (cursor.checked_sub_signed(fold)?, cursor.checked_add_signed(fold)?),
            Direction::Backward => (cursor.checked_add_signed(fold)?, cursor.checked_sub_signed(fold)?),
        };
        log::debug!("[search] start inside a DST fold, searching {from} .. {limit} again");

        self.walk(from, Some(limit), metrics, |c| self.localize_repeat(c))
    }

    /// Of two matches, the one the search reaches first.
    fn closer(&self, a: DateTime<Tz>, b: DateTime<Tz>) -> DateTime<Tz> {
        let a_first = match self.direction {
            Direction::Forward => a <= b,
            Direction::Backward => a >= b,
        };
        if a_first { a } else { b }
    }

    /// A timestamp pins the answer to one instant: it either qualifies or nothing does.
    fn search_timestamp(&self, epoch_seconds: i64, limit: Option<NaiveDateTime>) -> Result<DateTime<Tz>> {
        let instant = DateTime::from_timestamp(epoch_seconds, 0).ok_or_else(|| self.no_match())?;
        let found = instant.with_timezone(self.tz);

        if self.on_start_side(instant) && !self.beyond(found.naive_local(), limit) && self.satisfies_all(&found) {
            Ok(found)
        } else {
            Err(self.no_match())
        }
    }

    /// Drop sub-second precision, rounding towards the search direction.
    fn whole_second(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let truncated = local.with_nanosecond(0)?;
        if self.direction == Direction::Forward && truncated != local {
            return truncated.checked_add_signed(chrono::Duration::seconds(1));
        }
        Some(truncated)
    }

    fn nudge(&self, cursor: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.direction {
            Direction::Forward => cursor.checked_add_signed(chrono::Duration::seconds(1)),
            Direction::Backward => cursor.checked_sub_signed(chrono::Duration::seconds(1)),
        }
    }

    fn localize(&self, cursor: NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.tz.from_local_datetime(&cursor) {
            LocalResult::Single(found) => Some(found).filter(|dt| self.on_start_side(dt.with_timezone(&Utc))),
            LocalResult::Ambiguous(a, b) => {
                let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
                let ordered = match self.direction {
                    Direction::Forward => [earlier, later],
                    Direction::Backward => [later, earlier],
                };
                ordered.into_iter().find(|dt| self.on_start_side(dt.with_timezone(&Utc)))
            }
            LocalResult::None => None,
        }
    }

    /// Repeated wall times only, mapped to the pass the main walk does not pick first.
    fn localize_repeat(&self, cursor: NaiveDateTime) -> Option<DateTime<Tz>> {
        let LocalResult::Ambiguous(a, b) = self.tz.from_local_datetime(&cursor) else {
            return None;
        };
        let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
        let repeat = match self.direction {
            Direction::Forward => later,
            Direction::Backward => earlier,
        };
        Some(repeat).filter(|dt| self.on_start_side(dt.with_timezone(&Utc)))
    }

    fn narrow_forward(&self, c: NaiveDateTime) -> Step {
        let k = &self.constraints;
        let (year, month, day) = (c.year(), c.month(), c.day());
        let (hour, minute, second) = (c.hour(), c.minute(), c.second());

        match k.years.first_at_or_after(year) {
            None => return Step::Exhausted,
            Some(y) if y != year => return moved(calendar::start_of_year(y), "year"),
            Some(_) => {}
        }

        match k.months.first_at_or_after(month) {
            None => return moved(year.checked_add(1).and_then(calendar::start_of_year), "year"),
            Some(m) if m != month => return moved(calendar::start_of_month(year, m), "month"),
            Some(_) => {}
        }

        // Days depend on the month length and on the weekday, so test real dates.
        let allowed_day = (day..=calendar::days_in_month(year, month))
            .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .find(|date| k.date_allowed(*date));
        match allowed_day {
            None => return moved(calendar::start_of_next_month(c), "month"),
            Some(date) if date.day() != day => return moved(Some(calendar::start_of_day(date)), "day"),
            Some(_) => {}
        }

        match k.hours.first_at_or_after(hour) {
            None => return moved(calendar::start_of_next_day(c), "day"),
            Some(h) if h != hour => return moved(calendar::with_time(c, h, 0, 0), "hour"),
            Some(_) => {}
        }

        match k.minutes.first_at_or_after(minute) {
            None => return moved(calendar::start_of_next_hour(c), "hour"),
            Some(m) if m != minute => return moved(calendar::with_time(c, hour, m, 0), "minute"),
            Some(_) => {}
        }

        match k.seconds.first_at_or_after(second) {
            None => moved(calendar::start_of_next_minute(c), "minute"),
            Some(s) if s != second => moved(calendar::with_time(c, hour, minute, s), "second"),
            Some(_) => Step::Candidate,
        }
    }

    fn narrow_backward(&self, c: NaiveDateTime) -> Step {
        let k = &self.constraints;
        let (year, month, day) = (c.year(), c.month(), c.day());
        let (hour, minute, second) = (c.hour(), c.minute(), c.second());

        match k.years.last_at_or_before(year) {
            None => return Step::Exhausted,
            Some(y) if y != year => return moved(calendar::end_of_year(y), "year"),
            Some(_) => {}
        }

        match k.months.last_at_or_before(month) {
            None => return moved(year.checked_sub(1).and_then(calendar::end_of_year), "year"),
            Some(m) if m != month => return moved(calendar::end_of_month(year, m), "month"),
            Some(_) => {}
        }

        let allowed_day =
            (1..=day).rev().filter_map(|d| NaiveDate::from_ymd_opt(year, month, d)).find(|date| k.date_allowed(*date));
        match allowed_day {
            None => return moved(calendar::end_of_prev_month(c), "month"),
            Some(date) if date.day() != day => return moved(calendar::end_of_day(date), "day"),
            Some(_) => {}
        }

        match k.hours.last_at_or_before(hour) {
            None => return moved(calendar::end_of_prev_day(c), "day"),
            Some(h) if h != hour => return moved(calendar::with_time(c, h, 59, 59), "hour"),
            Some(_) => {}
        }

        match k.minutes.last_at_or_before(minute) {
            None => return moved(calendar::end_of_prev_hour(c), "hour"),
            Some(m) if m != minute => return moved(calendar::with_time(c, hour, m, 59), "minute"),
            Some(_) => {}
        }

        match k.seconds.last_at_or_before(second) {
            None => moved(calendar::end_of_prev_minute(c), "minute"),
            Some(s) if s != second => moved(calendar::with_time(c, hour, minute, s), "second"),
            Some(_) => Step::Candidate,
        }
    }
}

//! Per-field constraint sets.
//!
//! The search never evaluates predicates one by one while narrowing. Instead the
//! predicate list is folded once into a [`Constraints`] value: for every
//! calendar field, the set of values that *could* still match.
//!
//! ```text
//! Predicate::ExactDate  ─▶ years, months, days
//! Predicate::TimeOfDay  ─▶ hours, minutes, seconds
//! Predicate::Weekday    ─▶ weekdays
//! Predicate::Modulus    ─▶ seconds | minutes | hours | days
//! Predicate::Timestamp  ─▶ (handled outside narrowing)
//! ```
//!
//! Every predicate is an AND, so folding is just intersecting sets; the
//! resulting value does not depend on predicate order.
//!
//! ## Invariants
//!
//! - Each [`FieldSet`] only ever holds values in its `min..=max` range.
//! - An empty set means the whole predicate set is unsatisfiable; the search
//!   checks [`Constraints::is_satisfiable`] before moving the cursor at all.

use chrono::{Datelike, NaiveDate};

use crate::predicate::{Predicate, Unit};

bitflags::bitflags! {
    /// Which calendar fields a predicate set narrows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldMask: u8 {
        const YEAR      = 1 << 0;
        const MONTH     = 1 << 1;
        const DAY       = 1 << 2;
        const WEEKDAY   = 1 << 3;
        const HOUR      = 1 << 4;
        const MINUTE    = 1 << 5;
        const SECOND    = 1 << 6;
        const TIMESTAMP = 1 << 7;
    }
}

impl FieldMask {
    /// Short names of the set flags, coarse to fine.
    pub fn labels(self) -> Vec<&'static str> {
        let names = [
            (FieldMask::YEAR, "year"),
            (FieldMask::MONTH, "month"),
            (FieldMask::DAY, "day"),
            (FieldMask::WEEKDAY, "weekday"),
            (FieldMask::HOUR, "hour"),
            (FieldMask::MINUTE, "minute"),
            (FieldMask::SECOND, "second"),
            (FieldMask::TIMESTAMP, "timestamp"),
        ];
        names.into_iter().filter(|(flag, _)| self.contains(*flag)).map(|(_, name)| name).collect()
    }
}

/// A set of small integers (at most 64 distinct values) backed by a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldSet {
    bits: u64,
    min: u32,
    max: u32,
}

impl FieldSet {
    /// Every value in `min..=max`.
    pub fn full(min: u32, max: u32) -> Self {
        debug_assert!(max < 64 && min <= max);
        let bits = (min..=max).fold(0u64, |acc, v| acc | (1 << v));
        Self { bits, min, max }
    }

    /// Keep only values for which `keep` returns true.
    pub fn retain(&mut self, keep: impl Fn(u32) -> bool) {
        for v in self.min..=self.max {
            if !keep(v) {
                self.bits &= !(1 << v);
            }
        }
    }

    /// Keep only `value` (or nothing, if `value` is not in the set).
    pub fn restrict_to(&mut self, value: u32) {
        self.retain(|v| v == value);
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max && self.bits & (1 << value) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Smallest member `>= value`.
    pub fn first_at_or_after(&self, value: u32) -> Option<u32> {
        (value.max(self.min)..=self.max).find(|v| self.contains(*v))
    }

    /// Largest member `<= value`.
    pub fn last_at_or_before(&self, value: u32) -> Option<u32> {
        if value < self.min {
            return None;
        }
        (self.min..=value.min(self.max)).rev().find(|v| self.contains(*v))
    }
}

/// Allowed years. Only exact dates narrow the year, so a year is either
/// free, pinned to one value, or impossible (two different exact years).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum YearSet {
    Any,
    Only(i32),
    Never,
}

impl YearSet {
    fn restrict_to(&mut self, year: i32) {
        *self = match *self {
            YearSet::Any => YearSet::Only(year),
            YearSet::Only(y) if y == year => YearSet::Only(y),
            _ => YearSet::Never,
        };
    }

    pub fn first_at_or_after(&self, year: i32) -> Option<i32> {
        match *self {
            YearSet::Any => Some(year),
            YearSet::Only(y) if y >= year => Some(y),
            _ => None,
        }
    }

    pub fn last_at_or_before(&self, year: i32) -> Option<i32> {
        match *self {
            YearSet::Any => Some(year),
            YearSet::Only(y) if y <= year => Some(y),
            _ => None,
        }
    }
}

/// The folded form of a predicate list, one allowed-value set per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Constraints {
    pub years: YearSet,
    pub months: FieldSet,
    pub days: FieldSet,
    /// Indexed by `Weekday::num_days_from_monday`.
    pub weekdays: FieldSet,
    pub hours: FieldSet,
    pub minutes: FieldSet,
    pub seconds: FieldSet,
    /// Epoch seconds of every timestamp predicate.
    pub timestamps: Vec<i64>,
    pub mask: FieldMask,
}

impl Constraints {
    pub fn from_predicates(predicates: &[Predicate]) -> Self {
        let mut c = Constraints {
            years: YearSet::Any,
            months: FieldSet::full(1, 12),
            days: FieldSet::full(1, 31),
            weekdays: FieldSet::full(0, 6),
            hours: FieldSet::full(0, 23),
            minutes: FieldSet::full(0, 59),
            seconds: FieldSet::full(0, 59),
            timestamps: Vec::new(),
            mask: FieldMask::empty(),
        };

        for predicate in predicates {
            match predicate {
                Predicate::ExactDate { year, month, day } => {
                    c.years.restrict_to(*year);
                    c.months.restrict_to(*month);
                    c.days.restrict_to(*day);
                    c.mask |= FieldMask::YEAR | FieldMask::MONTH | FieldMask::DAY;
                }
                Predicate::TimeOfDay { hour, minute, second } => {
                    if let Some(h) = hour {
                        c.hours.restrict_to(*h);
                        c.mask |= FieldMask::HOUR;
                    }
                    if let Some(m) = minute {
                        c.minutes.restrict_to(*m);
                        c.mask |= FieldMask::MINUTE;
                    }
                    if let Some(s) = second {
                        c.seconds.restrict_to(*s);
                        c.mask |= FieldMask::SECOND;
                    }
                }
                Predicate::Weekday(weekday) => {
                    c.weekdays.restrict_to(weekday.num_days_from_monday());
                    c.mask |= FieldMask::WEEKDAY;
                }
                Predicate::Modulus { unit, divisor } => {
                    let (set, flag) = match unit {
                        Unit::Second => (&mut c.seconds, FieldMask::SECOND),
                        Unit::Minute => (&mut c.minutes, FieldMask::MINUTE),
                        Unit::Hour => (&mut c.hours, FieldMask::HOUR),
                        Unit::DayOfMonth => (&mut c.days, FieldMask::DAY),
                    };
                    set.retain(|v| v % divisor == 0);
                    c.mask |= flag;
                }
                Predicate::Timestamp { epoch_seconds } => {
                    c.timestamps.push(*epoch_seconds);
                    c.mask |= FieldMask::TIMESTAMP;
                }
            }
        }

        c
    }

    /// False if some field has no allowed value left.
    pub fn is_satisfiable(&self) -> bool {
        self.years != YearSet::Never
            && !self.months.is_empty()
            && !self.days.is_empty()
            && !self.weekdays.is_empty()
            && !self.hours.is_empty()
            && !self.minutes.is_empty()
            && !self.seconds.is_empty()
            && self.timestamps.windows(2).all(|w| w[0] == w[1])
    }

    /// Day-of-month and weekday check for a concrete date.
    pub fn date_allowed(&self, date: NaiveDate) -> bool {
        self.days.contains(date.day()) && self.weekdays.contains(date.weekday().num_days_from_monday())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn field_set_neighbours() {
        let mut minutes = FieldSet::full(0, 59);
        minutes.retain(|v| v % 15 == 0);
        assert_eq!(minutes.first_at_or_after(7), Some(15));
        assert_eq!(minutes.first_at_or_after(45), Some(45));
        assert_eq!(minutes.first_at_or_after(46), None);
        assert_eq!(minutes.last_at_or_before(14), Some(0));
        assert_eq!(minutes.last_at_or_before(59), Some(45));
    }

    #[test]
    fn one_based_field_set_bounds() {
        let mut days = FieldSet::full(1, 31);
        assert!(!days.contains(0));
        assert_eq!(days.last_at_or_before(0), None);
        days.retain(|d| d % 10 == 0);
        assert_eq!(days.first_at_or_after(1), Some(10));
        assert_eq!(days.last_at_or_before(31), Some(30));
    }

    #[test]
    fn conflicting_exact_dates_are_unsatisfiable() {
        let predicates = [
            Predicate::ExactDate { year: 2024, month: 1, day: 1 },
            Predicate::ExactDate { year: 2025, month: 1, day: 1 },
        ];
        let c = Constraints::from_predicates(&predicates);
        assert_eq!(c.years, YearSet::Never);
        assert!(!c.is_satisfiable());
    }

    #[test]
    fn modulus_and_time_of_day_intersect() {
        let predicates = [
            Predicate::Modulus { unit: Unit::Hour, divisor: 6 },
            Predicate::TimeOfDay { hour: Some(5), minute: None, second: None },
        ];
        let c = Constraints::from_predicates(&predicates);
        assert!(c.hours.is_empty());
        assert!(!c.is_satisfiable());
        assert_eq!(c.mask, FieldMask::HOUR);
    }

    #[test]
    fn predicate_order_does_not_matter() {
        let a = [
            Predicate::Weekday(Weekday::Mon),
            Predicate::Modulus { unit: Unit::Minute, divisor: 15 },
            Predicate::TimeOfDay { hour: None, minute: None, second: Some(0) },
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(Constraints::from_predicates(&a), Constraints::from_predicates(&b));
    }

    #[test]
    fn mask_labels_follow_field_order() {
        let mask = FieldMask::SECOND | FieldMask::YEAR | FieldMask::WEEKDAY;
        assert_eq!(mask.labels(), vec!["year", "weekday", "second"]);
    }
}

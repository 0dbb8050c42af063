use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};

/// Calendar field a modulus predicate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Second of the minute, 0-59.
    Second,
    /// Minute of the hour, 0-59.
    Minute,
    /// Hour of the day, 0-23.
    Hour,
    /// Day of the month, starting at 1.
    DayOfMonth,
}

impl Unit {
    /// Suffix letter used in the timespec grammar (`s`, `m`, `h`, `d`).
    pub fn suffix(self) -> char {
        match self {
            Unit::Second => 's',
            Unit::Minute => 'm',
            Unit::Hour => 'h',
            Unit::DayOfMonth => 'd',
        }
    }
}

/// A single constraint on a point in time.
///
/// All field-based variants are evaluated against the *local* calendar fields
/// of the instant in the query's timezone. [`Predicate::Timestamp`] is the only
/// timezone-independent variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Any time on the given calendar date.
    ExactDate { year: i32, month: u32, day: u32 },
    /// Hour/minute/second equality; `None` fields are wildcards.
    TimeOfDay { hour: Option<u32>, minute: Option<u32>, second: Option<u32> },
    /// Any time on the given day of the week.
    Weekday(Weekday),
    /// `field % divisor == 0`. Day-of-month values are 1-based.
    Modulus { unit: Unit, divisor: u32 },
    /// Exactly one second, given as POSIX epoch seconds.
    Timestamp { epoch_seconds: i64 },
}

impl Predicate {
    /// Check whether `date_time` satisfies this predicate.
    pub fn matches<Tz: TimeZone>(&self, date_time: &DateTime<Tz>) -> bool {
        match self {
            Predicate::ExactDate { year, month, day } => {
                date_time.year() == *year && date_time.month() == *month && date_time.day() == *day
            }
            Predicate::TimeOfDay { hour, minute, second } => {
                hour.is_none_or(|h| date_time.hour() == h)
                    && minute.is_none_or(|m| date_time.minute() == m)
                    && second.is_none_or(|s| date_time.second() == s)
            }
            Predicate::Weekday(weekday) => date_time.weekday() == *weekday,
            Predicate::Modulus { unit, divisor } => {
                let value = match unit {
                    Unit::Second => date_time.second(),
                    Unit::Minute => date_time.minute(),
                    Unit::Hour => date_time.hour(),
                    Unit::DayOfMonth => date_time.day(),
                };
                value % divisor == 0
            }
            Predicate::Timestamp { epoch_seconds } => date_time.timestamp() == *epoch_seconds,
        }
    }

    /// The UTC instant of a timestamp predicate, if this is one and it is representable.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Predicate::Timestamp { epoch_seconds } => DateTime::from_timestamp(*epoch_seconds, 0),
            _ => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part(value: &Option<u32>) -> String {
            value.map(|v| format!("{v:02}")).unwrap_or_default()
        }

        match self {
            Predicate::ExactDate { year, month, day } => write!(f, "{year:04}-{month:02}-{day:02}"),
            Predicate::TimeOfDay { hour, minute, second: None } => write!(f, "{}:{}", part(hour), part(minute)),
            Predicate::TimeOfDay { hour, minute, second } => {
                write!(f, "{}:{}:{}", part(hour), part(minute), part(second))
            }
            Predicate::Weekday(weekday) => write!(f, "{}", weekday.to_string().to_ascii_lowercase()),
            Predicate::Modulus { unit, divisor } => write!(f, "{divisor}{}", unit.suffix()),
            Predicate::Timestamp { epoch_seconds } => write!(f, "{epoch_seconds}"),
        }
    }
}

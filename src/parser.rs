//! Timespec tokenizer and classifier.
//!
//! A timespec is a whitespace-separated list of tokens. Each token is
//! classified on its own, and the first matching grammar wins:
//!
//! ```text
//! 2024-01-05      ExactDate     ^\d+-\d+-\d+$
//! mon .. sun      Weekday       case-insensitive, 3 letters
//! 1700000000      Timestamp     ^\d{10,}$
//! 15m, 2h, 5d     Modulus       ^\d*[smhd]$
//! 05:, :30, ::0   TimeOfDay     ^\d*:\d*(:\d*)?$
//! ```
//!
//! The order matters where grammars overlap superficially: a ten-digit number
//! is always a timestamp, and a date is tried before anything else. Tokens that
//! contain a `-` but are not a full `Y-M-D` are reported as malformed dates
//! rather than unrecognized tokens.
//!
//! The year of a date may be written with fewer than four digits (`24-1-5` is
//! the year 24). That is a lenient extension; four digits are the norm.

use chrono::{NaiveDate, Weekday};
use regex::Captures;

use crate::error::ParseError;
use crate::predicate::{Predicate, Unit};

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("mon", Weekday::Mon),
    ("tue", Weekday::Tue),
    ("wed", Weekday::Wed),
    ("thu", Weekday::Thu),
    ("fri", Weekday::Fri),
    ("sat", Weekday::Sat),
    ("sun", Weekday::Sun),
];

/// Split `text` on whitespace and classify every token.
pub(crate) fn parse_predicates(text: &str) -> Result<Vec<Predicate>, ParseError> {
    text.split_whitespace().map(classify).collect()
}

/// Classify a single (non-empty, whitespace-free) token.
pub(crate) fn classify(token: &str) -> Result<Predicate, ParseError> {
    let predicate = classify_inner(token)?;
    log::debug!("[parse] token={token:?} predicate={predicate:?}");
    Ok(predicate)
}

fn classify_inner(token: &str) -> Result<Predicate, ParseError> {
    if let Some(caps) = regex!(r"^(\d+)-(\d+)-(\d+)$").captures(token) {
        return parse_date(token, &caps);
    }
    if regex!(r"^[\d-]*-[\d-]*$").is_match(token) {
        return Err(ParseError::MalformedDate { token: token.to_string() });
    }

    if let Some(weekday) = parse_weekday(token) {
        return Ok(Predicate::Weekday(weekday));
    }

    if regex!(r"^\d{10,}$").is_match(token) {
        return parse_timestamp(token);
    }

    if let Some(caps) = regex!(r"^(\d*)([smhd])$").captures(token) {
        return parse_modulus(token, &caps);
    }

    if let Some(caps) = regex!(r"^(\d*):(\d*)(?::(\d*))?$").captures(token) {
        return parse_time_of_day(token, &caps);
    }

    Err(ParseError::UnrecognizedToken { token: token.to_string() })
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    WEEKDAYS.iter().find(|(name, _)| token.eq_ignore_ascii_case(name)).map(|(_, weekday)| *weekday)
}

fn parse_date(token: &str, caps: &Captures<'_>) -> Result<Predicate, ParseError> {
    let year: i32 = number(token, "year", &caps[1], "a representable year")?;
    let month: u32 = number(token, "month", &caps[2], "1-12")?;
    let day: u32 = number(token, "day", &caps[3], "1-31")?;

    if !(1..=12).contains(&month) {
        return Err(out_of_range(token, "month", &caps[2], "1-12"));
    }
    if !(1..=31).contains(&day) {
        return Err(out_of_range(token, "day", &caps[3], "1-31"));
    }
    // Day 30 of February and friends.
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(ParseError::MalformedDate { token: token.to_string() });
    }

    Ok(Predicate::ExactDate { year, month, day })
}

fn parse_timestamp(token: &str) -> Result<Predicate, ParseError> {
    let epoch_seconds: i64 = number(token, "timestamp", token, "a representable epoch second")?;
    let predicate = Predicate::Timestamp { epoch_seconds };
    if predicate.instant().is_none() {
        return Err(out_of_range(token, "timestamp", token, "a representable epoch second"));
    }
    Ok(predicate)
}

fn parse_modulus(token: &str, caps: &Captures<'_>) -> Result<Predicate, ParseError> {
    let digits = &caps[1];
    if digits.is_empty() {
        return Err(ParseError::MissingDivisor { token: token.to_string() });
    }

    let divisor: u32 = number(token, "divisor", digits, "a positive integer")?;
    if divisor == 0 {
        return Err(out_of_range(token, "divisor", digits, "a positive integer"));
    }

    let unit = match &caps[2] {
        "s" => Unit::Second,
        "m" => Unit::Minute,
        "h" => Unit::Hour,
        _ => Unit::DayOfMonth,
    };
    Ok(Predicate::Modulus { unit, divisor })
}

fn parse_time_of_day(token: &str, caps: &Captures<'_>) -> Result<Predicate, ParseError> {
    let hour = segment(token, "hour", caps.get(1).map(|m| m.as_str()), 23, "0-23")?;
    let minute = segment(token, "minute", caps.get(2).map(|m| m.as_str()), 59, "0-59")?;
    let second = segment(token, "second", caps.get(3).map(|m| m.as_str()), 59, "0-59")?;
    Ok(Predicate::TimeOfDay { hour, minute, second })
}

/// An empty (or missing) segment is a wildcard.
fn segment(
    token: &str,
    field: &'static str,
    text: Option<&str>,
    max: u32,
    expected: &'static str,
) -> Result<Option<u32>, ParseError> {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let value: u32 = number(token, field, text, expected)?;
    if value > max {
        return Err(out_of_range(token, field, text, expected));
    }
    Ok(Some(value))
}

/// Parse an all-digit string; the only way this fails is overflow.
fn number<T: std::str::FromStr>(
    token: &str,
    field: &'static str,
    text: &str,
    expected: &'static str,
) -> Result<T, ParseError> {
    text.parse().map_err(|_| out_of_range(token, field, text, expected))
}

fn out_of_range(token: &str, field: &'static str, value: &str, expected: &'static str) -> ParseError {
    ParseError::OutOfRangeValue { token: token.to_string(), field, value: value.to_string(), expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(hour: Option<u32>, minute: Option<u32>, second: Option<u32>) -> Predicate {
        Predicate::TimeOfDay { hour, minute, second }
    }

    #[test]
    fn classifies_each_kind() {
        let cases: Vec<(&str, Predicate)> = vec![
            ("2024-01-05", Predicate::ExactDate { year: 2024, month: 1, day: 5 }),
            ("2024-1-5", Predicate::ExactDate { year: 2024, month: 1, day: 5 }),
            ("mon", Predicate::Weekday(Weekday::Mon)),
            ("SUN", Predicate::Weekday(Weekday::Sun)),
            ("Fri", Predicate::Weekday(Weekday::Fri)),
            ("1700000000", Predicate::Timestamp { epoch_seconds: 1_700_000_000 }),
            ("15m", Predicate::Modulus { unit: Unit::Minute, divisor: 15 }),
            ("30s", Predicate::Modulus { unit: Unit::Second, divisor: 30 }),
            ("2h", Predicate::Modulus { unit: Unit::Hour, divisor: 2 }),
            ("1d", Predicate::Modulus { unit: Unit::DayOfMonth, divisor: 1 }),
            ("05:", time(Some(5), None, None)),
            ("05:30", time(Some(5), Some(30), None)),
            (":30", time(None, Some(30), None)),
            ("::30", time(None, None, Some(30))),
            ("::0", time(None, None, Some(0))),
            ("23:59:59", time(Some(23), Some(59), Some(59))),
            (":", time(None, None, None)),
        ];

        for (token, expected) in cases {
            assert_eq!(classify(token), Ok(expected), "token {token:?}");
        }
    }

    #[test]
    fn ten_digits_is_always_a_timestamp() {
        assert_eq!(classify("0000000001"), Ok(Predicate::Timestamp { epoch_seconds: 1 }));
        // Nine digits is too short for a timestamp and has no unit suffix.
        assert!(matches!(classify("123456789"), Err(ParseError::UnrecognizedToken { .. })));
    }

    #[test]
    fn short_years_are_accepted() {
        assert_eq!(classify("24-1-5"), Ok(Predicate::ExactDate { year: 24, month: 1, day: 5 }));
    }

    #[test]
    fn rejects_invalid_calendar_dates() {
        assert_eq!(classify("2024-02-30"), Err(ParseError::MalformedDate { token: "2024-02-30".to_string() }));
        assert_eq!(classify("2023-02-29"), Err(ParseError::MalformedDate { token: "2023-02-29".to_string() }));
        assert!(classify("2024-02-29").is_ok());
    }

    #[test]
    fn rejects_incomplete_dates() {
        for token in ["2024-01", "2024--01", "-01-01", "2024-01-01-"] {
            assert_eq!(classify(token), Err(ParseError::MalformedDate { token: token.to_string() }), "{token}");
        }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let cases = [("24:", "hour"), (":60", "minute"), ("::60", "second"), ("2024-13-01", "month"), ("2024-01-32", "day")];
        for (token, field) in cases {
            match classify(token) {
                Err(ParseError::OutOfRangeValue { field: got, .. }) => assert_eq!(got, field, "{token}"),
                other => panic!("expected out-of-range {field} for {token}, got {other:?}"),
            }
        }
    }

    #[test]
    fn modulus_requires_positive_divisor() {
        assert_eq!(classify("m"), Err(ParseError::MissingDivisor { token: "m".to_string() }));
        assert!(matches!(classify("0h"), Err(ParseError::OutOfRangeValue { field: "divisor", .. })));
        assert!(matches!(classify("99999999999s"), Err(ParseError::OutOfRangeValue { .. })));
    }

    #[test]
    fn modulus_suffix_is_case_sensitive() {
        assert!(matches!(classify("15M"), Err(ParseError::UnrecognizedToken { .. })));
        assert!(matches!(classify("2H"), Err(ParseError::UnrecognizedToken { .. })));
    }

    #[test]
    fn modulus_suffix_selects_the_unit() {
        let cases = [("7s", Unit::Second), ("7m", Unit::Minute), ("7h", Unit::Hour), ("7d", Unit::DayOfMonth)];
        for (token, unit) in cases {
            assert_eq!(classify(token), Ok(Predicate::Modulus { unit, divisor: 7 }), "{token}");
        }
    }

    #[test]
    fn rejects_unknown_tokens() {
        for token in ["monday", "tomorrow", "1:2:3:4", "12", "5x", "+5m"] {
            assert_eq!(classify(token), Err(ParseError::UnrecognizedToken { token: token.to_string() }), "{token}");
        }
    }

    #[test]
    fn splits_on_runs_of_whitespace() {
        let predicates = parse_predicates("  15m \t ::0\n mon ").unwrap();
        assert_eq!(
            predicates,
            vec![
                Predicate::Modulus { unit: Unit::Minute, divisor: 15 },
                time(None, None, Some(0)),
                Predicate::Weekday(Weekday::Mon),
            ]
        );
        assert_eq!(parse_predicates("   ").unwrap(), Vec::new());
    }

    #[test]
    fn fails_at_first_bad_token() {
        let err = parse_predicates("mon 2024-02-30 05:").unwrap_err();
        assert_eq!(err.token(), "2024-02-30");
    }
}

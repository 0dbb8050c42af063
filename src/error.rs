use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::engine::WINDOW_YEARS;

/// A timespec token that could not be turned into a predicate.
///
/// Every variant carries the offending token verbatim; parsing stops at the
/// first bad token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized token '{token}'")]
    UnrecognizedToken { token: String },

    #[error("{field} {value} out of range in '{token}' (expected {expected})")]
    OutOfRangeValue { token: String, field: &'static str, value: String, expected: &'static str },

    #[error("missing divisor in modulus '{token}'")]
    MissingDivisor { token: String },

    #[error("malformed date '{token}' (format should be YYYY-MM-DD)")]
    MalformedDate { token: String },
}

impl ParseError {
    /// The token the parser rejected.
    pub fn token(&self) -> &str {
        match self {
            ParseError::UnrecognizedToken { token }
            | ParseError::OutOfRangeValue { token, .. }
            | ParseError::MissingDivisor { token }
            | ParseError::MalformedDate { token } => token,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no matching time within {} years of {start}", WINDOW_YEARS)]
    NoMatchWithinWindow { start: DateTime<Utc> },

    #[error("empty candidates list")]
    EmptyCandidates,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_exposes_token() {
        let err = ParseError::OutOfRangeValue {
            token: "25:".to_string(),
            field: "hour",
            value: "25".to_string(),
            expected: "0-23",
        };
        assert_eq!(err.token(), "25:");
        assert_eq!(err.to_string(), "hour 25 out of range in '25:' (expected 0-23)");
    }

    #[test]
    fn parse_error_converts_into_error() {
        let err: Error = ParseError::MissingDivisor { token: "m".to_string() }.into();
        assert!(matches!(err, Error::Parse(ParseError::MissingDivisor { .. })));
        assert_eq!(err.to_string(), "missing divisor in modulus 'm'");
    }
}

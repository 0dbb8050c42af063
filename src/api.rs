use crate::engine::{self, FieldMask, SearchMetrics};
use crate::error::{ParseError, Result};
use crate::parser;
use crate::predicate::Predicate;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Which way the search walks from the start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Earliest matching instant at or after the start.
    #[default]
    Forward,
    /// Latest matching instant at or before the start.
    Backward,
}

/// Search context.
///
/// Holds everything besides the timespec text itself: where the search starts,
/// which timezone calendar fields are read in, and which way to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Instant the search starts from (inclusive).
    pub start: DateTime<Utc>,
    /// Timezone used to read year/month/day/hour/minute/second/weekday.
    pub tz: Tz,
    pub direction: Direction,
}

impl Context {
    /// Start at `start`, in UTC, searching forward.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { start, tz: chrono_tz::UTC, direction: Direction::Forward }
    }

    /// Start at the current system time. The clock is read once, here.
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn with_tz(self, tz: Tz) -> Self {
        Self { tz, ..self }
    }

    pub fn with_direction(self, direction: Direction) -> Self {
        Self { direction, ..self }
    }

    /// Search backwards from the start instant.
    pub fn reversed(self) -> Self {
        self.with_direction(Direction::Backward)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::now()
    }
}

/// A parsed timespec together with its search context.
///
/// Built once, searched once. Predicates are combined with AND and their order
/// does not affect the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimespecQuery {
    predicates: Vec<Predicate>,
    start: DateTime<Utc>,
    tz: Tz,
    direction: Direction,
}

impl TimespecQuery {
    /// Parse whitespace-separated `text` in `context`.
    pub fn parse(text: &str, context: &Context) -> std::result::Result<Self, ParseError> {
        Ok(Self::new(parser::parse_predicates(text)?, context))
    }

    /// Build a query from predicates that were already parsed (or constructed by hand).
    pub fn new(predicates: Vec<Predicate>, context: &Context) -> Self {
        Self { predicates, start: context.start, tz: context.tz, direction: context.direction }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Calendar fields narrowed by this query's predicates.
    pub fn constrained_fields(&self) -> FieldMask {
        engine::Constraints::from_predicates(&self.predicates).mask
    }

    /// Whether `instant` satisfies every predicate (the start instant is not considered).
    pub fn matches(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.tz);
        self.predicates.iter().all(|p| p.matches(&local))
    }

    /// Run the search and return the matching instant in the query's timezone.
    pub fn next_match(&self) -> Result<DateTime<Tz>> {
        self.run().result
    }

    /// Like [`TimespecQuery::next_match`], also returning search metrics.
    pub fn run(&self) -> engine::SearchRun<Tz> {
        engine::Search::new(&self.predicates, self.start, &self.tz, self.direction).run()
    }

    /// Pick the first of `candidates` (in search order) that satisfies every predicate.
    ///
    /// The candidates are sorted first, ascending for a forward query and
    /// descending for a backward one. The start instant is not used.
    pub fn first_candidate<I>(&self, candidates: I) -> Result<DateTime<Tz>>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let search = engine::Search::new(&self.predicates, self.start, &self.tz, self.direction);
        search.first_candidate(candidates.into_iter().collect())
    }
}

/// Result from [`resolve_verbose`].
#[derive(Debug, Clone)]
pub struct SearchDetails {
    /// The timespec text as given.
    pub text: String,
    /// The parsed query, if parsing succeeded.
    pub query: Option<TimespecQuery>,
    pub result: Result<DateTime<Tz>>,
    pub metrics: SearchMetrics,
}

/// Parse `text` with a default [`Context`] (now, UTC, forward).
///
/// # Example
/// ```
/// let query = timespec::parse("15m ::0").unwrap();
/// assert_eq!(query.predicates().len(), 2);
/// ```
pub fn parse(text: &str) -> std::result::Result<TimespecQuery, ParseError> {
    parse_with(text, &Context::default())
}

/// Parse `text` in the provided `context`.
pub fn parse_with(text: &str, context: &Context) -> std::result::Result<TimespecQuery, ParseError> {
    TimespecQuery::parse(text, context)
}

/// Parse and search in one go.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use timespec::Context;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 7, 0).unwrap();
/// let found = timespec::resolve("15m ::0", &Context::at(start)).unwrap();
/// assert_eq!(found, Utc.with_ymd_and_hms(2024, 1, 1, 0, 15, 0).unwrap());
/// ```
pub fn resolve(text: &str, context: &Context) -> Result<DateTime<Tz>> {
    parse_with(text, context)?.next_match()
}

/// Parse and search, keeping the parsed query and the search metrics around for reporting.
pub fn resolve_verbose(text: &str, context: &Context) -> SearchDetails {
    let query = match parse_with(text, context) {
        Ok(query) => query,
        Err(err) => {
            return SearchDetails {
                text: text.to_string(),
                query: None,
                result: Err(err.into()),
                metrics: SearchMetrics::default(),
            };
        }
    };

    let run = query.run();
    SearchDetails { text: text.to_string(), query: Some(query), result: run.result, metrics: run.metrics }
}

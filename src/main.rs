mod debug_report;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;
use timespec::{Context, Direction, Error, resolve_verbose};

const TZ_ENV: &str = "TIMESPEC_TZ";

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let ctx = Context { start: config.start, tz: config.tz, direction: config.direction };

    if !config.candidates.is_empty() {
        return run_candidates(&config, &ctx);
    }

    let details = resolve_verbose(&config.input, &ctx);
    if config.verbose {
        debug_report::print_run(&details, config.color);
    }

    match details.result {
        Ok(found) => {
            println!("{}", config.format.render(&found));
            ExitCode::from(0)
        }
        Err(err) => report_failure(&err),
    }
}

fn run_candidates(config: &CliConfig, ctx: &Context) -> ExitCode {
    let query = match timespec::parse_with(&config.input, ctx) {
        Ok(query) => query,
        Err(err) => return report_failure(&err.into()),
    };

    match query.first_candidate(config.candidates.iter().copied()) {
        Ok(found) => {
            println!("{}", config.format.render(&found));
            ExitCode::from(0)
        }
        Err(err) => report_failure(&err),
    }
}

fn report_failure(err: &Error) -> ExitCode {
    eprintln!("error: {err}");
    match err {
        Error::NoMatchWithinWindow { .. } => ExitCode::from(1),
        Error::Parse(_) | Error::EmptyCandidates => ExitCode::from(2),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Rfc3339,
    Epoch,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, String> {
        match value {
            "rfc3339" => Ok(Self::Rfc3339),
            "epoch" => Ok(Self::Epoch),
            _ => Err(format!("error: invalid --format '{value}' (expected rfc3339 or epoch)")),
        }
    }

    fn render(self, found: &DateTime<Tz>) -> String {
        match self {
            Self::Rfc3339 => found.to_rfc3339(),
            Self::Epoch => found.timestamp().to_string(),
        }
    }
}

struct CliConfig {
    input: String,
    start: DateTime<Utc>,
    tz: Tz,
    direction: Direction,
    candidates: Vec<DateTime<Utc>>,
    format: OutputFormat,
    verbose: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut start: Option<String> = None;
    let mut tz: Option<String> = std::env::var(TZ_ENV).ok().filter(|v| !v.trim().is_empty());
    let mut direction = Direction::Forward;
    let mut candidates: Vec<String> = Vec::new();
    let mut format = OutputFormat::Rfc3339;
    let mut verbose = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("timespec {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "-r" | "--reverse" => direction = Direction::Backward,
            "-v" | "--verbose" => verbose = true,
            "--color" => color = true,
            "--no-color" => color = false,
            "--start" => start = Some(expect_value(&mut args, "--start")?),
            "--tz" => tz = Some(expect_value(&mut args, "--tz")?),
            "--candidate" => candidates.push(expect_value(&mut args, "--candidate")?),
            "--format" => format = OutputFormat::parse(&expect_value(&mut args, "--format")?)?,
            "--" => {
                tokens.extend(args.by_ref());
                break;
            }
            _ if arg.starts_with("--start=") => start = Some(arg.trim_start_matches("--start=").to_string()),
            _ if arg.starts_with("--tz=") => tz = Some(arg.trim_start_matches("--tz=").to_string()),
            _ if arg.starts_with("--candidate=") => candidates.push(arg.trim_start_matches("--candidate=").to_string()),
            _ if arg.starts_with("--format=") => format = OutputFormat::parse(arg.trim_start_matches("--format="))?,
            // `-` alone is not an option, and neither is anything that starts with a digit.
            _ if arg.starts_with("--") || (arg.starts_with('-') && arg.len() == 2) => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => tokens.push(arg),
        }
    }

    let tz = match tz {
        Some(name) => parse_tz(&name)?,
        None => chrono_tz::UTC,
    };

    let start = match start {
        Some(value) => parse_datetime(&value, &tz).map_err(|e| format!("error: invalid --start {e}"))?,
        None => Utc::now(),
    };

    let candidates = candidates
        .iter()
        .map(|value| parse_datetime(value, &tz).map_err(|e| format!("error: invalid --candidate {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    let input = if tokens.is_empty() && !io::stdin().is_terminal() { read_stdin_input()? } else { tokens.join(" ") };

    Ok(CliConfig { input, start, tz, direction, candidates, format, verbose, color })
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("error: {flag} expects a value"))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_tz(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>().map_err(|_| format!("error: unknown timezone '{name}'"))
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` read as wall time in `tz`.
fn parse_datetime(value: &str, tz: &Tz) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| format!("'{value}' (expected RFC 3339 or YYYY-MM-DDTHH:MM:SS)"))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{value}' (does not exist in {tz})"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "timespec {version}

Find the next point in time matching a timespec.

Usage:
  timespec [OPTIONS] [--] <predicate...>

Predicates (all must hold):
  YYYY-MM-DD                 That calendar date.
  HH:MM:SS, HH:, :MM, ::SS   Time of day; empty parts match anything.
  mon tue wed thu fri sat sun
                             Day of the week.
  <n>s <n>m <n>h <n>d        Second/minute/hour/day of month divisible by n.
  <epoch seconds>            Exactly that timestamp (10 or more digits).

Options:
  --start <datetime>         Start of the search (RFC 3339, or YYYY-MM-DDTHH:MM:SS
                             in the selected timezone). Default: now.
  --tz <name>                IANA timezone for reading calendar fields.
                             Default: ${tz_env}, else UTC.
  -r, --reverse              Find the latest match at or before the start.
  --candidate <datetime>     Pick the first matching datetime from the given
                             candidates instead of searching (repeatable).
  --format <rfc3339|epoch>   Output format. Default: rfc3339.
  -v, --verbose              Print the parsed predicates and search metrics.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  A match was found.
  1  No match within {window} years.
  2  Invalid arguments or timespec.
",
        version = env!("CARGO_PKG_VERSION"),
        tz_env = TZ_ENV,
        window = timespec::WINDOW_YEARS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datetime_accepts_rfc3339_and_naive() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        assert_eq!(parse_datetime("2024-01-01T11:00:00Z", &tz), Ok(expected));
        assert_eq!(parse_datetime("2024-01-01T12:00:00", &tz), Ok(expected));
        assert!(parse_datetime("yesterday", &tz).is_err());
    }

    #[test]
    fn parse_datetime_rejects_gap_times() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        assert!(parse_datetime("2024-03-31T02:30:00", &tz).is_err());
    }

    #[test]
    fn output_formats() {
        let found = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap().with_timezone(&chrono_tz::UTC);
        assert_eq!(OutputFormat::Epoch.render(&found), "1700000000");
        assert_eq!(OutputFormat::Rfc3339.render(&found), "2023-11-14T22:13:20+00:00");
        assert!(OutputFormat::parse("iso").is_err());
    }
}

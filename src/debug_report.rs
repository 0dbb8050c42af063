use timespec::{Error, SearchDetails};

const RESET: &str = "\x1b[0m";

/// One colour per role in the report; plain text when disabled.
struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn wrap(&self, code: &str, s: impl AsRef<str>) -> String {
        if self.enabled { format!("{}{}{}", code, s.as_ref(), RESET) } else { s.as_ref().to_string() }
    }

    fn title(&self, s: impl AsRef<str>) -> String {
        self.wrap("\x1b[1;36m", s)
    }

    fn section(&self, name: &str) -> String {
        self.wrap("\x1b[90m", format!("━━━ {name} ━━━"))
    }

    fn index(&self, idx: usize) -> String {
        self.wrap("\x1b[90m", format!("[{idx}]"))
    }

    fn label(&self, s: impl AsRef<str>) -> String {
        self.wrap("\x1b[2m", s)
    }

    fn found(&self, s: impl AsRef<str>) -> String {
        self.wrap("\x1b[1;32m", s)
    }

    fn field(&self, s: impl AsRef<str>) -> String {
        self.wrap("\x1b[34m", s)
    }

    fn context(&self, s: impl AsRef<str>) -> String {
        self.wrap("\x1b[36m", s)
    }

    fn count(&self, n: impl ToString) -> String {
        self.wrap("\x1b[33m", n.to_string())
    }

    fn problem(&self, s: impl AsRef<str>) -> String {
        self.wrap("\x1b[33m", s)
    }
}

pub fn print_run(details: &SearchDetails, color: bool) {
    let palette = Palette::new(color);
    println!("\n{}", palette.title(format!("⚙  Timespec: \"{}\"", details.text.trim())));

    println!("\n{}", palette.section("Predicates"));
    print_predicates(details, &palette);

    println!("\n{}", palette.section("Result"));
    print_result(details, &palette);

    println!("\n{}", palette.section("Search"));
    let metrics = &details.metrics;
    println!(
        "  Steps: {}  │  Carries: {}  │  Skipped local times: {}  │  Elapsed: {}",
        palette.count(metrics.steps),
        palette.count(metrics.carries),
        palette.count(metrics.skipped_local_times),
        palette.context(format!("{:?}", metrics.elapsed)),
    );
    println!();
}

fn print_predicates(details: &SearchDetails, palette: &Palette) {
    let Some(query) = &details.query else {
        println!("  {}", palette.label("Parsing failed, nothing to search"));
        return;
    };

    if query.predicates().is_empty() {
        println!("  {}", palette.label("None (every instant matches)"));
    }
    for (idx, predicate) in query.predicates().iter().enumerate() {
        println!(
            "  {} {} {} {}",
            palette.index(idx),
            palette.found(predicate.to_string()),
            palette.label("│"),
            palette.label(format!("{:?}", predicate)),
        );
    }

    let fields = query.constrained_fields().labels();
    println!(
        "  {} {}  {} {}  {} {}  {} {:?}",
        palette.label("fields:"),
        palette.field(if fields.is_empty() { "-".to_string() } else { fields.join(", ") }),
        palette.label("│ tz:"),
        palette.context(query.tz().name()),
        palette.label("│ start:"),
        palette.context(query.start().to_rfc3339()),
        palette.label("│ direction:"),
        query.direction(),
    );
}

fn print_result(details: &SearchDetails, palette: &Palette) {
    match &details.result {
        Ok(found) => println!("  {}", palette.found(found.to_rfc3339())),
        Err(Error::Parse(err)) => {
            println!("  {}", palette.problem(err.to_string()));
            println!("  {} {}", palette.label("token:"), palette.field(err.token()));
        }
        Err(err) => println!("  {}", palette.problem(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_plain_when_disabled() {
        let palette = Palette::new(false);
        assert_eq!(palette.section("Result"), "━━━ Result ━━━");
        assert_eq!(palette.count(3), "3");
        assert_eq!(palette.found("2024-01-01T00:00:00+00:00"), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn palette_wraps_and_resets_when_enabled() {
        let palette = Palette::new(true);
        assert_eq!(palette.field("hour"), "\x1b[34mhour\x1b[0m");
        assert!(palette.title("x").ends_with(RESET));
    }
}

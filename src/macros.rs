/// Compile an anchored pattern once and hand back a `&'static Regex`.
///
/// Every token classifier in `parser.rs` goes through this so the regex is built
/// on first use and shared afterwards.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

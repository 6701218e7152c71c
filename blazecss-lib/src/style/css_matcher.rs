use log::warn;
use regex::Regex;
use std::collections::HashSet;

/// Class, id and tag tokens observed in a document, e.g. `div`, `.card`, `#main`.
pub type UsedSelectorSet = HashSet<String>;

/// Patterns kept regardless of what the document uses.
const DEFAULT_SAFELIST: &[&str] = &[
    // Responsive helpers
    "mobile-*",
    "tablet-*",
    "desktop-*",
    "sm:*",
    "md:*",
    "lg:*",
    "xl:*",
    "hidden-*",
    "show-*",
    "visible-*",
    "col-*",
    "row-*",
    "grid-*",
    "flex-*",
    "order-*",
    "w-*",
    "h-*",
    "gap-*",
    "space-*",
    "p-*",
    "m-*",
    // WordPress defaults
    "wp-*",
    "alignfull",
    "alignwide",
    "has-*",
    // Common framework classes
    "container",
    "container-fluid",
    "row",
    "col",
    "nav",
    "navbar",
    "btn",
    "card",
    "modal",
    // Custom properties live here
    ":root",
];

/// Pseudo-classes and pseudo-elements ignored when checking usage.
const PSEUDO_SUFFIXES: &[&str] = &[
    "hover",
    "focus",
    "active",
    "visited",
    "first-child",
    "last-child",
    "nth-child",
    "before",
    "after",
];

/// An ordered list of glob patterns (`*` matches any run of characters),
/// each compiled once into an anchored regex.
#[derive(Debug, Clone)]
pub struct Safelist {
    patterns: Vec<String>,
    compiled: Vec<Regex>,
}

impl PartialEq for Safelist {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for Safelist {}

impl Default for Safelist {
    fn default() -> Self {
        Safelist::new(DEFAULT_SAFELIST.iter().copied())
    }
}

impl Safelist {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::compile(patterns.into_iter().map(Into::into).collect())
    }

    pub fn empty() -> Self {
        Self::compile(Vec::new())
    }

    fn compile(patterns: Vec<String>) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|pattern| match glob_regex(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("Ignoring safelist pattern `{}`: {}", pattern, e);
                    None
                }
            })
            .collect();
        Safelist { patterns, compiled }
    }

    /// Hands the current pattern list to `extend` and keeps whatever it returns.
    ///
    /// This is the hook embedders use to add (or remove) patterns without
    /// touching global state:
    ///
    /// ```
    /// use blazecss_lib::style::css_matcher::Safelist;
    ///
    /// let safelist = Safelist::default().extend_with(|mut base| {
    ///     base.push(".js-*".to_string());
    ///     base
    /// });
    /// assert!(safelist.is_allow_listed(".js-toggle"));
    /// ```
    pub fn extend_with<F>(self, extend: F) -> Self
    where
        F: FnOnce(Vec<String>) -> Vec<String>,
    {
        Self::compile(extend(self.patterns))
    }

    pub fn push(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        match glob_regex(&pattern) {
            Ok(regex) => self.compiled.push(regex),
            Err(e) => warn!("Ignoring safelist pattern `{}`: {}", pattern, e),
        }
        self.patterns.push(pattern);
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Matches the selector exactly as written: `col-*` does not cover `.col-6`.
    pub fn is_allow_listed(&self, selector: &str) -> bool {
        self.compiled.iter().any(|regex| regex.is_match(selector))
    }
}

/// Anchored regex for a glob: literal runs are escaped and each `*` becomes `.*`.
pub fn glob_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("(?s)^{}$", body))
}

/// Full-string glob match. `*` matches zero or more characters, everything
/// else is literal and case-sensitive.
pub fn matches(pattern: &str, selector: &str) -> bool {
    glob_regex(pattern).map_or(false, |regex| regex.is_match(selector))
}

/// True if any pattern matches the selector. Stops at the first match.
pub fn is_allow_listed<S: AsRef<str>>(selector: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .any(|pattern| matches(pattern.as_ref(), selector))
}

/// Cuts the selector at the first ignored pseudo-class or pseudo-element.
/// For `::before` style pseudo-elements both colons go.
pub fn strip_pseudo(selector: &str) -> &str {
    let bytes = selector.as_bytes();
    for (i, _) in selector.match_indices(':') {
        let rest = &selector[i + 1..];
        if PSEUDO_SUFFIXES.iter().any(|suffix| rest.starts_with(suffix)) {
            let cut = if i > 0 && bytes[i - 1] == b':' { i - 1 } else { i };
            return &selector[..cut];
        }
    }
    selector
}

fn strip_sigil(selector: &str) -> Option<&str> {
    selector.strip_prefix(|c: char| c == '.' || c == '#')
}

/// Permissive usage check: the selector (minus ignored pseudo suffixes) counts as
/// used when it appears as a substring of any used token. The selector without its
/// leading `.`/`#` is tried too, so bare token sets such as `{"foo"}` match `.foo`.
pub fn is_used(selector: &str, used_selectors: &UsedSelectorSet) -> bool {
    let needle = strip_pseudo(selector);
    let bare = strip_sigil(needle);

    used_selectors.iter().any(|used| {
        used.contains(needle) || bare.map_or(false, |bare| used.contains(bare))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(tokens: &[&str]) -> UsedSelectorSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_glob_is_anchored() {
        assert!(matches("col-*", "col-md-6"));
        assert!(matches("col-*", "col-"));
        assert!(!matches("col-*", "x-col-md"));
        assert!(matches("row", "row"));
        assert!(!matches("row", "rows"));
        assert!(!matches("row", "arrow"));
    }

    #[test]
    fn test_glob_multiple_wildcards() {
        assert!(matches("*-btn-*", ".primary-btn-lg"));
        assert!(matches("a*b*c", "abc"));
        assert!(matches("a*b*c", "axxbyyc"));
        assert!(!matches("a*b*c", "axxbyy"));
        assert!(matches("*", ""));
        assert!(!matches("", "a"));
    }

    #[test]
    fn test_glob_is_case_sensitive_and_literal() {
        assert!(!matches("Card", "card"));
        // `.` is a literal dot, not "any character"
        assert!(!matches("a.c", "abc"));
        assert!(matches("sm:*", "sm:flex"));
    }

    #[test]
    fn test_default_safelist() {
        let safelist = Safelist::default();
        assert!(safelist.is_allow_listed("container"));
        assert!(safelist.is_allow_listed("wp-block-image"));
        assert!(safelist.is_allow_listed(":root"));
        assert!(safelist.is_allow_listed("col-md-6"));
        assert!(!safelist.is_allow_listed(".container"));
        assert!(!safelist.is_allow_listed(".col-6"));
        assert!(!safelist.is_allow_listed(".container .title"));
        assert!(!safelist.is_allow_listed("footer"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("a+b", "a+b"));
        assert!(!matches("a+b", "aab"));
        assert!(matches("[data-x]*", "[data-x=\"1\"]"));
        assert!(!matches("(x)", "x"));
        assert!(matches("*", "multi\nline"));
    }

    #[test]
    fn test_push_and_patterns() {
        let mut safelist = Safelist::empty();
        assert!(!safelist.is_allow_listed(".is-open"));
        safelist.push(".is-*");
        assert!(safelist.is_allow_listed(".is-open"));
        assert_eq!(safelist.patterns(), &[".is-*".to_string()]);
        assert_eq!(safelist, Safelist::new([".is-*"]));
    }

    #[test]
    fn test_extend_with_can_add_and_remove() {
        let safelist = Safelist::default().extend_with(|base| {
            let mut patterns: Vec<String> = base.into_iter().filter(|p| p != "btn").collect();
            patterns.push(".keep-*".to_string());
            patterns
        });
        assert!(!safelist.is_allow_listed("btn"));
        assert!(safelist.is_allow_listed(".keep-me"));
    }

    #[test]
    fn test_strip_pseudo() {
        assert_eq!(strip_pseudo(".btn:hover"), ".btn");
        assert_eq!(strip_pseudo("li:nth-child(2n+1) a"), "li");
        assert_eq!(strip_pseudo(".icon::before"), ".icon");
        assert_eq!(strip_pseudo("input:focus-visible"), "input");
        assert_eq!(strip_pseudo("a:not(.b)"), "a:not(.b)");
        assert_eq!(strip_pseudo(":hover"), "");
    }

    #[test]
    fn test_is_used_substring_semantics() {
        let used = used(&[".card", "div", "#main"]);
        assert!(is_used(".card", &used));
        assert!(is_used(".card:hover", &used));
        assert!(is_used(".car", &used));
        assert!(is_used("#main", &used));
        assert!(!is_used(".card .title", &used));
        assert!(!is_used(".footer", &used));
    }

    #[test]
    fn test_is_used_with_bare_tokens() {
        let used = used(&["foo"]);
        assert!(is_used(".foo", &used));
        assert!(is_used("#foo", &used));
        assert!(!is_used(".bar", &used));
    }

    #[test]
    fn test_is_used_empty_set() {
        assert!(!is_used(".foo", &UsedSelectorSet::new()));
    }
}

//! # Wildcard Module
//!
//! Shell-style glob selection over plain identifiers (region codes, instance
//! types). Patterns are anchored and case-sensitive: `*` matches any run of
//! characters, `?` one character, `[...]` / `[!...]` a character class.
//! There is no brace alternation.

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Whether `value` matches a single pattern. A `[` with no closing `]`
/// matches itself; the rest of the pattern keeps its wildcards.
pub fn matches(value: &str, pattern: &str) -> bool {
    Compiled::new(pattern).matches(value)
}

/// Whether `value` matches at least one of `patterns`; always false for an
/// empty pattern list.
pub fn matches_any<S: AsRef<str>>(value: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches(value, p.as_ref()))
}

/// Every value matching at least one pattern, in input order. A value that
/// matches several patterns is still returned once. Empty when `patterns` is
/// empty.
pub fn filter<I, V, S>(values: I, patterns: &[S]) -> Vec<String>
where
    I: IntoIterator<Item = V>,
    V: AsRef<str>,
    S: AsRef<str>,
{
    if patterns.is_empty() {
        return Vec::new();
    }
    let compiled: Vec<Compiled<'_>> = patterns.iter().map(|p| Compiled::new(p.as_ref())).collect();
    values
        .into_iter()
        .filter(|v| compiled.iter().any(|c| c.matches(v.as_ref())))
        .map(|v| v.as_ref().to_string())
        .collect()
}

/// Pattern compiled once for repeated matching
enum Compiled<'a> {
    Glob(Pattern),
    Literal(&'a str),
}

impl<'a> Compiled<'a> {
    fn new(pattern: &'a str) -> Self {
        match Pattern::new(&escape_unclosed_classes(&collapse_stars(pattern))) {
            Ok(pat) => Compiled::Glob(pat),
            Err(_) => Compiled::Literal(pattern),
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Compiled::Glob(pat) => pat.matches_with(value, MATCH_OPTIONS),
            Compiled::Literal(lit) => *lit == value,
        }
    }
}

/// `glob` reserves `**` for whole path components and rejects it elsewhere;
/// for flat identifiers any run of stars means the same as one.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut prev_star = false;
    for c in pattern.chars() {
        if c == '*' && prev_star {
            continue;
        }
        prev_star = c == '*';
        out.push(c);
    }
    out
}

/// Rewrite every `[` that does not open a complete class as `[[]`. A `]`
/// right after `[` or `[!` is a class member, not the terminator.
fn escape_unclosed_classes(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '[' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let mut j = i + 1;
        if chars.get(j) == Some(&'!') {
            j += 1;
        }
        if chars.get(j) == Some(&']') {
            j += 1;
        }
        while j < chars.len() && chars[j] != ']' {
            j += 1;
        }
        if j < chars.len() {
            out.extend(&chars[i..=j]);
            i = j + 1;
        } else {
            out.push_str("[[]");
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_stars() {
        assert_eq!(collapse_stars("m5**"), "m5*");
        assert_eq!(collapse_stars("***"), "*");
        assert_eq!(collapse_stars("a*b*c"), "a*b*c");
    }

    #[test]
    fn test_escape_unclosed_classes() {
        assert_eq!(escape_unclosed_classes("m5[.*"), "m5[[].*");
        assert_eq!(escape_unclosed_classes("*["), "*[[]");
        assert_eq!(escape_unclosed_classes("eu-west-[12]"), "eu-west-[12]");
        assert_eq!(escape_unclosed_classes("[]]x["), "[]]x[[]");
        assert_eq!(escape_unclosed_classes("a[!]"), "a[[]!]");
    }

    #[test]
    fn test_double_star_behaves_like_single() {
        assert!(matches("m5.large", "m5**"));
        assert!(matches("m5.large", "**.large"));
    }
}

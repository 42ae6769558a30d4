//! Caller-facing title filters.
//!
//! A filter uses `%` as a multi-character wildcard and is always matched as
//! an unanchored substring search. Runs of `%` collapse into one wildcard.

const WILDCARD: char = '%';

/// Regex token for the wildcard. Only matches any sequence of characters,
/// line breaks included, under [`REGEX_OPTIONS`].
const REGEX_ANY: &str = ".*";

/// Dot-all: `.` also matches `\n`.
pub(crate) const REGEX_OPTIONS: &str = "s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TitlePattern {
    fragments: Vec<String>,
}

impl TitlePattern {
    /// `None` for an empty filter, which means "no title restriction".
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let fragments = raw
            .split(WILDCARD)
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self { fragments })
    }

    /// Regular expression form, with literal text escaped and a match-any
    /// token at both ends. Evaluate it with [`REGEX_OPTIONS`].
    pub(crate) fn to_regex(&self) -> String {
        let mut regex = String::from(REGEX_ANY);
        for fragment in &self.fragments {
            regex.push_str(&escape_regex(fragment));
            regex.push_str(REGEX_ANY);
        }
        regex
    }

    pub(crate) fn matches(&self, title: &str) -> bool {
        let mut rest = title;
        for fragment in &self.fragments {
            match rest.find(fragment.as_str()) {
                Some(idx) => rest = &rest[idx + fragment.len()..],
                None => return false,
            }
        }
        true
    }
}

fn escape_regex(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

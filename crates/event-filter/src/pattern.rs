//! Glob pattern matching for schema and table names.
//!
//! Patterns use `*` (any run of characters), `?` (exactly one character)
//! and `[...]` character classes (`[!...]` negates). Everything else is
//! literal. Patterns compile to anchored regexes once and are matched many
//! times.

use crate::error::PatternError;
use regex::{Regex, RegexBuilder};

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    regex: Regex,
    is_wildcard: bool,
}

impl PatternMatcher {
    /// Compile a glob pattern.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_filter::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new("foo*", false).unwrap();
    /// assert!(matcher.matches("FOO_1"));
    ///
    /// let matcher = PatternMatcher::new("foo*", true).unwrap();
    /// assert!(!matcher.matches("FOO_1"));
    /// ```
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| PatternError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            is_wildcard: pattern.chars().all(|c| c == '*'),
        })
    }

    #[inline]
    pub fn matches(&self, text: &str) -> bool {
        self.is_wildcard || self.regex.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_wildcard(&self) -> bool {
        self.is_wildcard
    }
}

/// Any-of set of glob patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<PatternMatcher>,
}

impl PatternSet {
    pub fn from_patterns(patterns: &[String], case_sensitive: bool) -> Result<Self, PatternError> {
        let patterns = patterns
            .iter()
            .map(|p| PatternMatcher::new(p, case_sensitive))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(text))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

/// Convert a glob pattern to an anchored regex.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                // Copy the class through; an unclosed '[' is literal
                let class: String = chars.clone().take_while(|c| *c != ']').collect();
                let closed = chars.clone().nth(class.chars().count()) == Some(']');
                if closed && !class.is_empty() {
                    out.push('[');
                    let body = match class.strip_prefix('!') {
                        Some(rest) => {
                            out.push('^');
                            rest
                        }
                        None => class.as_str(),
                    };
                    out.push_str(&body.replace('\\', "\\\\").replace('[', "\\["));
                    out.push(']');
                    for _ in 0..=class.chars().count() {
                        chars.next();
                    }
                } else {
                    out.push_str(r"\[");
                }
            }
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}

use crate::error::{Error, Result};
use regex::{NoExpand, Regex};
use std::borrow::Cow;

const REGEX_META: &[char] = &[
    '.', '*', '+', '-', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Backslash-escapes every regex metacharacter so `s` matches only itself.
pub fn escape_pattern(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if REGEX_META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Replaces every occurrence of `needle` in `haystack` with `replacement`,
/// both taken literally. An empty needle leaves the haystack untouched.
pub fn replace_all_literal(haystack: &str, needle: &str, replacement: &str) -> Result<String> {
    if needle.is_empty() {
        return Ok(haystack.to_string());
    }
    let rule = LiteralRule::new(needle, replacement)?;
    Ok(rule.apply(haystack).into_owned())
}

/// A literal pattern compiled once and reused for every fragment.
#[derive(Debug, Clone)]
pub struct LiteralRule {
    pattern: String,
    regex: Regex,
    replacement: String,
}

impl LiteralRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::EmptyPattern("literal"));
        }
        let regex = Regex::new(&escape_pattern(pattern)).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            replacement: replacement.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.regex.replace_all(text, NoExpand(&self.replacement))
    }

    /// Rewrites `text` only when the pattern occurs; returns whether it did.
    pub fn apply_in_place(&self, text: &mut String) -> bool {
        let replaced = match self.apply(text) {
            Cow::Owned(replaced) => replaced,
            Cow::Borrowed(_) => return false,
        };
        *text = replaced;
        true
    }

    /// Byte ranges of the non-overlapping matches, left to right.
    pub fn find_ranges<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = std::ops::Range<usize>> + 'a {
        self.regex.find_iter(text).map(|m| m.range())
    }
}

//! Field patterns and their matches.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::error::PatternError;

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Move both ends by `offset`.
    pub fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// Something that can locate one field in a piece of text.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Find the first match in `text`. Offsets are relative to `text`.
    fn find<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>>;

    /// Record keys a match can produce.
    fn output_keys(&self) -> Vec<String>;
}

/// A named regular expression declared by a vendor profile.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    name: String,
    regex: Regex,
    group_names: Vec<String>,
}

impl FieldPattern {
    /// Compile a pattern. Invalid syntax is rejected here, never during a scan.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, PatternError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| PatternError::Invalid {
            name: name.clone(),
            source,
        })?;
        let group_names = regex
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect();

        Ok(Self {
            name,
            regex,
            group_names,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Number of capture groups, not counting the implicit whole-match group.
    pub fn arity(&self) -> usize {
        self.regex.captures_len() - 1
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl Matcher for FieldPattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn find<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;

        let groups = (1..caps.len())
            .map(|i| caps.get(i).map(|m| Span::new(m.start(), m.end())))
            .collect();

        let named = self
            .regex
            .capture_names()
            .enumerate()
            .filter_map(|(i, name)| {
                let m = caps.get(i)?;
                Some((name?.to_string(), Span::new(m.start(), m.end())))
            })
            .collect();

        Some(PatternMatch {
            haystack: text,
            base: 0,
            span: Span::new(whole.start(), whole.end()),
            groups,
            named,
        })
    }

    fn output_keys(&self) -> Vec<String> {
        if self.group_names.is_empty() {
            vec![self.name.clone()]
        } else {
            self.group_names.clone()
        }
    }
}

/// One match of a [`Matcher`], with its capture groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    haystack: &'t str,
    base: usize,
    span: Span,
    groups: Vec<Option<Span>>,
    named: Vec<(String, Span)>,
}

impl<'t> PatternMatch<'t> {
    /// Build a match by hand, for matchers that are not regex based.
    pub fn new(haystack: &'t str, span: Span, groups: Vec<Option<Span>>, named: Vec<(String, Span)>) -> Self {
        Self {
            haystack,
            base: 0,
            span,
            groups,
            named,
        }
    }

    /// Span of the whole match, including any offset applied by [`shifted`](Self::shifted).
    pub fn span(&self) -> Span {
        self.span.shifted(self.base)
    }

    pub fn start(&self) -> usize {
        self.span().start
    }

    pub fn end(&self) -> usize {
        self.span().end
    }

    /// True for zero-width matches.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn as_str(&self) -> &'t str {
        &self.haystack[self.span.start..self.span.end]
    }

    /// Capture group by index; `0` is the whole match.
    pub fn group(&self, index: usize) -> Option<&'t str> {
        if index == 0 {
            return Some(self.as_str());
        }
        let span = (*self.groups.get(index - 1)?)?;
        Some(&self.haystack[span.start..span.end])
    }

    /// Capture group by name.
    pub fn name(&self, name: &str) -> Option<&'t str> {
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, span)| &self.haystack[span.start..span.end])
    }

    /// All named groups that took part in the match.
    pub fn named(&self) -> impl Iterator<Item = (&str, &'t str)> + '_ {
        self.named
            .iter()
            .map(|(n, span)| (n.as_str(), &self.haystack[span.start..span.end]))
    }

    pub fn has_named_groups(&self) -> bool {
        !self.named.is_empty()
    }

    /// Value of an unnamed pattern: group 1 if present, otherwise the whole match.
    pub fn primary(&self) -> &'t str {
        self.group(1).unwrap_or_else(|| self.as_str())
    }

    /// Re-base the match so that [`span`](Self::span) reports offsets into
    /// a larger document whose slice starting at `offset` was searched.
    pub fn shifted(mut self, offset: usize) -> Self {
        self.base += offset;
        self
    }
}

//! Glob-style path patterns.
//!
//! # Responsibilities
//! - Compile pattern strings into segment lists
//! - Match request paths segment by segment
//! - Compare two patterns by specificity
//!
//! # Design Decisions
//! - `**` spans any number of segments, `*`/`?` stay inside one segment,
//!   `{var}` consumes exactly one segment
//! - No regex: recursive segment matching is O(segments) for the common
//!   case and bounded by pattern length
//! - Specificity: fewer `**`, then fewer single wildcards, then a longer
//!   literal portion

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Exact text, e.g. `hello`.
    Literal(String),
    /// `{var}` or a bare `*`: exactly one segment, any content.
    Capture,
    /// `**`: zero or more segments.
    MultiWildcard,
    /// A segment containing inline `*`/`?`, e.g. `report-*.csv`.
    Glob(String),
}

/// A compiled glob path pattern.
///
/// Equality and hashing use the raw pattern text so specs carrying the same
/// pattern collapse regardless of where they were advertised from.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern string. Leading/trailing slashes are tolerated;
    /// an empty pattern matches only the empty path.
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "**" {
                    Segment::MultiWildcard
                } else if s == "*" || (s.starts_with('{') && s.ends_with('}')) {
                    Segment::Capture
                } else if s.contains('*') || s.contains('?') {
                    Segment::Glob(s.to_string())
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Test a request path against this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_from(&self.segments, &parts)
    }

    /// Number of `**` segments.
    pub fn multi_wildcards(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::MultiWildcard))
            .count()
    }

    /// Number of single-segment wildcards plus inline glob characters.
    pub fn single_wildcards(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Capture => 1,
                Segment::Glob(g) => g.chars().filter(|c| *c == '*' || *c == '?').count(),
                _ => 0,
            })
            .sum()
    }

    /// Total length of the literal (non-wildcard) text.
    pub fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.len(),
                Segment::Glob(g) => g.chars().filter(|c| *c != '*' && *c != '?').count(),
                _ => 0,
            })
            .sum()
    }

    /// Order two patterns by specificity: `Less` means `self` is the more
    /// specific pattern. Ties report `Equal` so a stable sort preserves
    /// declaration order.
    pub fn compare_specificity(&self, other: &PathPattern) -> Ordering {
        self.multi_wildcards()
            .cmp(&other.multi_wildcards())
            .then_with(|| self.single_wildcards().cmp(&other.single_wildcards()))
            .then_with(|| other.literal_len().cmp(&self.literal_len()))
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PathPattern {}

impl Hash for PathPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

fn match_from(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::MultiWildcard, rest)) => {
            (0..=path.len()).any(|skip| match_from(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((part, tail)) => segment_matches(segment, part) && match_from(rest, tail),
            None => false,
        },
    }
}

fn segment_matches(segment: &Segment, part: &str) -> bool {
    match segment {
        Segment::Literal(text) => text == part,
        Segment::Capture => true,
        Segment::MultiWildcard => true,
        Segment::Glob(glob) => glob_matches(glob.as_bytes(), part.as_bytes()),
    }
}

fn glob_matches(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => {
            glob_matches(&pattern[1..], text)
                || (!text.is_empty() && glob_matches(pattern, &text[1..]))
        }
        Some(b'?') => !text.is_empty() && glob_matches(&pattern[1..], &text[1..]),
        Some(&c) => text.first() == Some(&c) && glob_matches(&pattern[1..], &text[1..]),
    }
}

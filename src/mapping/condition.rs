//! Param, header and media-type conditions.
//!
//! # Responsibilities
//! - Parse `name`, `!name`, `name=value`, `name!=value` expressions
//! - Evaluate expressions against request params/headers (AND semantics
//!   across a spec's expression list)
//! - Parse and compare media types for consumes/produces constraints
//!
//! # Design Decisions
//! - Expressions keep their raw text: it drives equality/hashing and logging
//! - Media type parameters (`;q=0.9`, `;charset=...`) are ignored; only
//!   type/subtype participate in matching

use std::fmt;

/// A single name/value constraint on a request param or header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameValueExpr {
    raw: String,
    name: String,
    value: Option<String>,
    negated: bool,
}

impl NameValueExpr {
    /// Parse one expression. The grammar mirrors conventional HTTP route
    /// conditions: `name`, `!name`, `name=value`, `name!=value`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        if let Some(idx) = raw.find("!=") {
            return Self {
                name: raw[..idx].to_string(),
                value: Some(raw[idx + 2..].to_string()),
                negated: true,
                raw,
            };
        }
        if let Some(idx) = raw.find('=') {
            return Self {
                name: raw[..idx].to_string(),
                value: Some(raw[idx + 1..].to_string()),
                negated: false,
                raw,
            };
        }
        if let Some(stripped) = raw.strip_prefix('!') {
            return Self {
                name: stripped.to_string(),
                value: None,
                negated: true,
                raw,
            };
        }
        Self {
            name: raw.clone(),
            value: None,
            negated: false,
            raw,
        }
    }

    /// The constrained name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Evaluate against the actual value of the named param/header, if any.
    pub fn evaluate(&self, actual: Option<&str>) -> bool {
        match (&self.value, self.negated) {
            (Some(expected), false) => actual == Some(expected.as_str()),
            (Some(expected), true) => actual != Some(expected.as_str()),
            (None, false) => actual.is_some(),
            (None, true) => actual.is_none(),
        }
    }
}

impl fmt::Display for NameValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A `type/subtype` media type, parameters stripped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaType {
    main: String,
    sub: String,
}

impl MediaType {
    /// Parse a media type, ignoring anything after a `;`.
    /// Returns `None` for text without a `/`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.split(';').next().unwrap_or("").trim();
        let (main, sub) = raw.split_once('/')?;
        if main.is_empty() || sub.is_empty() {
            return None;
        }
        Some(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
        })
    }

    /// Parse a comma-delimited list (e.g. an `Accept` header), dropping
    /// entries that fail to parse.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',').filter_map(Self::parse).collect()
    }

    /// Whether `self` (possibly a wildcard) covers `other`.
    /// `*/*` covers everything, `text/*` covers `text/html`.
    pub fn includes(&self, other: &MediaType) -> bool {
        (self.main == "*" || self.main == other.main)
            && (self.sub == "*" || self.sub == other.sub)
    }

    /// Wildcard compatibility in either direction, used for produces
    /// against the `Accept` list.
    pub fn is_compatible_with(&self, other: &MediaType) -> bool {
        self.includes(other) || other.includes(self)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_expression() {
        let e = NameValueExpr::parse("token");
        assert!(e.evaluate(Some("anything")));
        assert!(!e.evaluate(None));
    }

    #[test]
    fn test_absence_expression() {
        let e = NameValueExpr::parse("!debug");
        assert_eq!(e.name(), "debug");
        assert!(e.evaluate(None));
        assert!(!e.evaluate(Some("1")));
    }

    #[test]
    fn test_equals_expression() {
        let e = NameValueExpr::parse("version=2");
        assert!(e.evaluate(Some("2")));
        assert!(!e.evaluate(Some("3")));
        assert!(!e.evaluate(None));
    }

    #[test]
    fn test_not_equals_expression() {
        let e = NameValueExpr::parse("version!=2");
        assert!(!e.evaluate(Some("2")));
        assert!(e.evaluate(Some("3")));
        // Absent value also differs from the expected one.
        assert!(e.evaluate(None));
    }

    #[test]
    fn test_media_type_parse() {
        let m = MediaType::parse("Application/JSON; charset=utf-8").unwrap();
        assert_eq!(m.to_string(), "application/json");
        assert!(MediaType::parse("garbage").is_none());
    }

    #[test]
    fn test_media_type_wildcards() {
        let any = MediaType::parse("*/*").unwrap();
        let text_any = MediaType::parse("text/*").unwrap();
        let html = MediaType::parse("text/html").unwrap();
        let json = MediaType::parse("application/json").unwrap();

        assert!(any.includes(&json));
        assert!(text_any.includes(&html));
        assert!(!text_any.includes(&json));
        assert!(!html.includes(&text_any));
        assert!(html.is_compatible_with(&text_any));
    }

    #[test]
    fn test_accept_list() {
        let list = MediaType::parse_list("text/html, application/json;q=0.9, junk");
        assert_eq!(list.len(), 2);
    }
}

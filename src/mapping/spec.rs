//! Compiled mapping specs.
//!
//! # Responsibilities
//! - Bundle path patterns, method set and conditions into one matching rule
//! - Evaluate a request against all conditions (AND semantics)
//! - Rank two matching specs by specificity
//!
//! # Design Decisions
//! - `PartialEq`/`Hash` cover every field except the endpoint id: two
//!   instances of the same logical endpoint advertise value-identical specs
//!   that must collapse to one registry entry, while the id still travels
//!   with the spec for header propagation
//! - Specificity precedence: path pattern, then method-set narrowness, then
//!   param and header condition counts, then consumes/produces narrowness;
//!   remaining ties keep declaration order via stable sort

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::mapping::condition::{MediaType, NameValueExpr};
use crate::mapping::method::HttpMethod;
use crate::mapping::pattern::PathPattern;

/// Read-only view of a request, implemented once per integration surface.
/// The matching algorithm never sees the underlying framework types.
pub trait RequestView {
    /// Request path, already relative to whatever prefix the caller strips.
    fn path(&self) -> &str;

    /// Request method; `None` for extension methods outside the closed set.
    fn method(&self) -> Option<HttpMethod>;

    /// Header lookup, case-insensitive on the name.
    fn header(&self, name: &str) -> Option<String>;

    /// Query-parameter lookup.
    fn param(&self, name: &str) -> Option<String>;

    /// Parsed `Content-Type`, if present and well-formed.
    fn content_type(&self) -> Option<MediaType> {
        self.header("content-type")
            .and_then(|v| MediaType::parse(&v))
    }

    /// Parsed `Accept` list; empty means "anything".
    fn accept(&self) -> Vec<MediaType> {
        self.header("accept")
            .map(|v| MediaType::parse_list(&v))
            .unwrap_or_default()
    }
}

/// An immutable endpoint-mapping rule.
#[derive(Debug, Clone)]
pub struct MappingSpec {
    patterns: Vec<PathPattern>,
    methods: BTreeSet<HttpMethod>,
    params: Vec<NameValueExpr>,
    headers: Vec<NameValueExpr>,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
    endpoint_id: Option<i64>,
}

impl MappingSpec {
    /// Start a spec from its path patterns. Patterns are required; every
    /// other constraint defaults to "unconstrained".
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect(),
            methods: BTreeSet::new(),
            params: Vec::new(),
            headers: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            endpoint_id: None,
        }
    }

    pub fn methods<I: IntoIterator<Item = HttpMethod>>(mut self, methods: I) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn params<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.params = exprs
            .into_iter()
            .map(|e| NameValueExpr::parse(e.as_ref()))
            .collect();
        self
    }

    pub fn headers<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.headers = exprs
            .into_iter()
            .map(|e| NameValueExpr::parse(e.as_ref()))
            .collect();
        self
    }

    pub fn consumes<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.consumes = types
            .into_iter()
            .filter_map(|t| MediaType::parse(t.as_ref()))
            .collect();
        self
    }

    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.produces = types
            .into_iter()
            .filter_map(|t| MediaType::parse(t.as_ref()))
            .collect();
        self
    }

    pub fn endpoint_id(mut self, id: i64) -> Self {
        self.endpoint_id = Some(id);
        self
    }

    /// The opaque backend operation id, absent for exclusion-only specs.
    pub fn id(&self) -> Option<i64> {
        self.endpoint_id
    }

    /// Raw pattern strings, mainly for logging.
    pub fn pattern_strings(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }

    /// Evaluate every condition against the request.
    pub fn matches(&self, req: &dyn RequestView) -> bool {
        if !self.patterns.iter().any(|p| p.matches(req.path())) {
            return false;
        }
        if !self.methods.is_empty() {
            match req.method() {
                Some(m) if self.methods.contains(&m) => {}
                _ => return false,
            }
        }
        if !self
            .params
            .iter()
            .all(|e| e.evaluate(req.param(e.name()).as_deref()))
        {
            return false;
        }
        if !self
            .headers
            .iter()
            .all(|e| e.evaluate(req.header(e.name()).as_deref()))
        {
            return false;
        }
        if !self.consumes.is_empty() {
            if let Some(ct) = req.content_type() {
                if !self.consumes.iter().any(|c| c.includes(&ct)) {
                    return false;
                }
            }
        }
        if !self.produces.is_empty() {
            let accept = req.accept();
            if !accept.is_empty()
                && !self
                    .produces
                    .iter()
                    .any(|p| accept.iter().any(|a| a.is_compatible_with(p)))
            {
                return false;
            }
        }
        true
    }

    /// Rank two specs that both matched `path`: `Less` means `self` wins.
    pub fn compare_specificity(&self, other: &MappingSpec, path: &str) -> Ordering {
        let pattern_order = match (self.best_pattern(path), other.best_pattern(path)) {
            (Some(a), Some(b)) => a.compare_specificity(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        pattern_order
            .then_with(|| narrowness(self.methods.len()).cmp(&narrowness(other.methods.len())))
            .then_with(|| other.params.len().cmp(&self.params.len()))
            .then_with(|| other.headers.len().cmp(&self.headers.len()))
            .then_with(|| narrowness(self.consumes.len()).cmp(&narrowness(other.consumes.len())))
            .then_with(|| narrowness(self.produces.len()).cmp(&narrowness(other.produces.len())))
    }

    /// The most specific of this spec's patterns that matches `path`.
    fn best_pattern(&self, path: &str) -> Option<&PathPattern> {
        self.patterns
            .iter()
            .filter(|p| p.matches(path))
            .min_by(|a, b| a.compare_specificity(b))
    }
}

/// Alternative sets (methods, media types): empty means "all", so empty is
/// the broadest and smaller non-empty sets are narrower.
fn narrowness(len: usize) -> usize {
    if len == 0 {
        usize::MAX
    } else {
        len
    }
}

impl PartialEq for MappingSpec {
    fn eq(&self, other: &Self) -> bool {
        // endpoint_id deliberately excluded
        self.patterns == other.patterns
            && self.methods == other.methods
            && self.params == other.params
            && self.headers == other.headers
            && self.consumes == other.consumes
            && self.produces == other.produces
    }
}

impl Eq for MappingSpec {}

impl Hash for MappingSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.patterns.hash(state);
        self.methods.hash(state);
        self.params.hash(state);
        self.headers.hash(state);
        self.consumes.hash(state);
        self.produces.hash(state);
    }
}

//! Request matching against a registry snapshot.
//!
//! # Responsibilities
//! - Apply the route's exclusion veto before any candidate
//! - Compute the sub-path relative to the application prefix
//! - Evaluate candidates and rank matches by specificity
//!
//! # Design Decisions
//! - Pure reads of the snapshot: no locks, no suspension, safe under any
//!   number of concurrent calls
//! - Exclusion is evaluated against the same sub-path as the candidates,
//!   so one pattern vocabulary serves both
//! - Stable sort on specificity keeps first-registered on ties
//! - Excluded and no-match are distinct outcomes: both pass through, but
//!   the caller reports them separately

use crate::mapping::{HttpMethod, MappingSpec, MediaType, RequestView};
use crate::routing::snapshot::Snapshot;

/// Successful match outcome: what to attach and where to forward.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    /// Opaque id of the matched backend operation.
    pub endpoint_id: i64,
    /// The rewritten forwarding path (the application prefix stripped).
    pub sub_path: String,
}

/// Result of matching one request against one logical route.
///
/// `Excluded` and `NoMatch` both mean pass-through for the caller's
/// forwarding decision; they stay separate so each can be observed on its
/// own.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// An endpoint matched; forward with this id and rewritten path.
    Matched(RouteMatch),
    /// The route's exclusion spec vetoed the request.
    Excluded,
    /// Unknown route, or no candidate matched.
    NoMatch,
}

impl MatchOutcome {
    /// The match, if one was found.
    pub fn into_match(self) -> Option<RouteMatch> {
        match self {
            MatchOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Match a request against one logical route in the given snapshot.
///
/// Every non-`Matched` outcome means the caller falls back to its default
/// handling: unknown route and unmatched requests report `NoMatch`, a
/// vetoed request reports `Excluded`.
pub fn match_request(
    snapshot: &Snapshot,
    route_id: &str,
    application: &str,
    req: &dyn RequestView,
) -> MatchOutcome {
    let Some(entry) = snapshot.route(route_id) else {
        return MatchOutcome::NoMatch;
    };

    let sub_path = sub_path_after(req.path(), application);
    let view = SubPathView {
        inner: req,
        path: &sub_path,
    };

    if let Some(exclusion) = entry.exclusion() {
        if exclusion.matches(&view) {
            tracing::trace!(route_id = %route_id, path = %req.path(), "Request excluded");
            return MatchOutcome::Excluded;
        }
    }

    let mut matched: Vec<&MappingSpec> = entry
        .specs()
        .iter()
        .filter(|spec| spec.matches(&view))
        .collect();

    if matched.is_empty() {
        return MatchOutcome::NoMatch;
    }

    matched.sort_by(|a, b| a.compare_specificity(b, &sub_path));
    let best = matched[0];

    match best.id() {
        Some(endpoint_id) => MatchOutcome::Matched(RouteMatch {
            endpoint_id,
            sub_path: sub_path.clone(),
        }),
        None => MatchOutcome::NoMatch,
    }
}

/// The portion of `path` following the leading `/{application}` segment.
/// `/svc1/hello/world` with application `svc1` yields `/hello/world`; a
/// path not starting with the prefix yields the empty string.
fn sub_path_after(path: &str, application: &str) -> String {
    let prefix = format!("/{application}");
    path.strip_prefix(&prefix).unwrap_or("").to_string()
}

/// Wraps a request view, substituting the computed sub-path while every
/// other accessor delegates to the original request.
struct SubPathView<'a> {
    inner: &'a dyn RequestView,
    path: &'a str,
}

impl RequestView for SubPathView<'_> {
    fn path(&self) -> &str {
        self.path
    }

    fn method(&self) -> Option<HttpMethod> {
        self.inner.method()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.inner.header(name)
    }

    fn param(&self, name: &str) -> Option<String> {
        self.inner.param(name)
    }

    fn content_type(&self) -> Option<MediaType> {
        self.inner.content_type()
    }

    fn accept(&self) -> Vec<MediaType> {
        self.inner.accept()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::snapshot::SnapshotBuilder;
    use std::collections::HashMap;

    struct FakeRequest {
        path: String,
        method: HttpMethod,
        headers: HashMap<String, String>,
    }

    impl FakeRequest {
        fn get(path: &str) -> Self {
            Self {
                path: path.to_string(),
                method: HttpMethod::Get,
                headers: HashMap::new(),
            }
        }
    }

    impl RequestView for FakeRequest {
        fn path(&self) -> &str {
            &self.path
        }
        fn method(&self) -> Option<HttpMethod> {
            Some(self.method)
        }
        fn header(&self, name: &str) -> Option<String> {
            self.headers.get(&name.to_ascii_lowercase()).cloned()
        }
        fn param(&self, _name: &str) -> Option<String> {
            None
        }
    }

    fn snapshot_with(specs: Vec<MappingSpec>, exclusion: Option<MappingSpec>) -> Snapshot {
        let mut builder = SnapshotBuilder::new();
        builder.add_route("r1", exclusion);
        for spec in specs {
            builder.add_spec("r1", spec);
        }
        builder.build()
    }

    #[test]
    fn test_basic_match_rewrites_path() {
        let snapshot = snapshot_with(
            vec![MappingSpec::new(["/hello/**"])
                .methods([HttpMethod::Get])
                .endpoint_id(1)],
            None,
        );
        let req = FakeRequest::get("/svc1/hello/world");
        let m = match_request(&snapshot, "r1", "svc1", &req)
            .into_match()
            .unwrap();
        assert_eq!(m.endpoint_id, 1);
        assert_eq!(m.sub_path, "/hello/world");
    }

    #[test]
    fn test_unknown_route_is_no_match() {
        let snapshot = snapshot_with(vec![], None);
        let req = FakeRequest::get("/svc1/hello");
        assert_eq!(
            match_request(&snapshot, "other", "svc1", &req),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_exclusion_reported_distinctly_from_no_match() {
        let snapshot = snapshot_with(
            vec![MappingSpec::new(["/hello/**"])
                .methods([HttpMethod::Get])
                .endpoint_id(1)],
            Some(MappingSpec::new(["/hello/**"]).methods([HttpMethod::Get])),
        );
        // The veto fires before the candidate is even evaluated.
        let req = FakeRequest::get("/svc1/hello/world");
        assert_eq!(
            match_request(&snapshot, "r1", "svc1", &req),
            MatchOutcome::Excluded
        );

        // A path neither excluded nor advertised is plain no-match.
        let req = FakeRequest::get("/svc1/other");
        assert_eq!(
            match_request(&snapshot, "r1", "svc1", &req),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_exclusion_only_applies_to_its_shape() {
        let snapshot = snapshot_with(
            vec![MappingSpec::new(["/hello/**"]).endpoint_id(1)],
            Some(MappingSpec::new(["/hello/**"]).methods([HttpMethod::Post])),
        );
        // GET is not excluded; only POST is.
        let req = FakeRequest::get("/svc1/hello/world");
        assert!(match_request(&snapshot, "r1", "svc1", &req)
            .into_match()
            .is_some());
    }

    #[test]
    fn test_sub_path_strips_only_leading_prefix() {
        let snapshot = snapshot_with(
            vec![MappingSpec::new(["/echo/**"]).endpoint_id(1)],
            None,
        );
        // The application name recurring later in the path stays intact.
        let req = FakeRequest::get("/svc1/echo/svc1/tail");
        let m = match_request(&snapshot, "r1", "svc1", &req)
            .into_match()
            .unwrap();
        assert_eq!(m.sub_path, "/echo/svc1/tail");
    }

    #[test]
    fn test_specificity_picks_literal_over_wildcard() {
        let snapshot = snapshot_with(
            vec![
                MappingSpec::new(["/a/**"]).endpoint_id(1),
                MappingSpec::new(["/a/b"])
                    .methods([HttpMethod::Get])
                    .endpoint_id(2),
            ],
            None,
        );
        let req = FakeRequest::get("/x/a/b");
        let m = match_request(&snapshot, "r1", "x", &req)
            .into_match()
            .unwrap();
        assert_eq!(m.endpoint_id, 2);
    }

    #[test]
    fn test_tie_keeps_declaration_order() {
        let snapshot = snapshot_with(
            vec![
                MappingSpec::new(["/t/one"]).endpoint_id(10),
                MappingSpec::new(["/t/two", "/t/one"]).endpoint_id(20),
            ],
            None,
        );
        let req = FakeRequest::get("/app/t/one");
        let m = match_request(&snapshot, "r1", "app", &req)
            .into_match()
            .unwrap();
        assert_eq!(m.endpoint_id, 10);
    }

    #[test]
    fn test_no_candidates_is_no_match() {
        let snapshot = snapshot_with(vec![], None);
        let req = FakeRequest::get("/svc1/hello");
        assert_eq!(
            match_request(&snapshot, "r1", "svc1", &req),
            MatchOutcome::NoMatch
        );
    }
}

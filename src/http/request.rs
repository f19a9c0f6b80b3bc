//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) as early as possible
//! - Adapt the framework request into the routing `RequestView` seam
//!
//! # Design Decisions
//! - An existing `x-request-id` header is preserved, never overwritten
//! - Query parsing is minimal: first value wins, no percent decoding in
//!   the matching path

use std::collections::HashMap;
use std::task::{Context, Poll};

use axum::http::request::Parts;
use axum::http::{HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::mapping::{HttpMethod, RequestView};

/// Canonical request-id header name.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Ensures every request carries an `x-request-id` header.
#[derive(Debug, Clone)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if !req.headers().contains_key(X_REQUEST_ID) {
            if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
                req.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        self.inner.call(req)
    }
}

/// `RequestView` over decomposed request parts.
pub struct HttpRequestView<'a> {
    parts: &'a Parts,
    params: HashMap<String, String>,
}

impl<'a> HttpRequestView<'a> {
    pub fn new(parts: &'a Parts) -> Self {
        let params = parts.uri.query().map(parse_query).unwrap_or_default();
        Self { parts, params }
    }
}

impl RequestView for HttpRequestView<'_> {
    fn path(&self) -> &str {
        self.parts.uri.path()
    }

    fn method(&self) -> Option<HttpMethod> {
        HttpMethod::from_http(&self.parts.method)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    fn param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    params
}

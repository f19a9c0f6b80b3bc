//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Resolve the logical route and application name per request
//! - Invoke the matcher against the current snapshot
//! - Forward matched requests to a chosen instance
//!
//! # Design Decisions
//! - Every pass-through outcome (no application segment, no route, no
//!   snapshot, excluded, no candidate, no instance) falls back to the
//!   gateway default response; discovery trouble never becomes a 5xx
//! - The matcher's result is threaded explicitly (endpoint id + rewritten
//!   path); no per-request side-channel state

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{RouteDefinition, SharedConfig, ALL_SERVICES};
use crate::discovery::ServiceDirectory;
use crate::forward::InstanceChooser;
use crate::http::request::{HttpRequestView, RequestIdLayer, X_REQUEST_ID};
use crate::http::ENDPOINT_ID_HEADER;
use crate::observability::metrics;
use crate::routing::{match_request, MappingRegistry, MatchOutcome};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub registry: Arc<MappingRegistry>,
    pub directory: Arc<dyn ServiceDirectory>,
    pub chooser: Arc<dyn InstanceChooser>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server exposing the endpoint-mapping router.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(
        config: SharedConfig,
        registry: Arc<MappingRegistry>,
        directory: Arc<dyn ServiceDirectory>,
        chooser: Arc<dyn InstanceChooser>,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let request_timeout = config.load().timeouts.request_secs;

        let state = AppState {
            config,
            registry,
            directory,
            chooser,
            client,
        };

        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(request_timeout)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: match the request against the current snapshot and
/// forward it with the endpoint id attached, or fall through.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = parts.uri.path().to_string();

    // First path segment names the target application. Without one the
    // matcher is never invoked.
    let Some(application) = application_name(&path) else {
        tracing::trace!(request_id = %request_id, path = %path, "No application name in path");
        return default_response();
    };

    let config = state.config.load();
    let Some(route) = select_route(&config.routes, application) else {
        tracing::trace!(request_id = %request_id, application = %application, "No endpoint-mapped route");
        return default_response();
    };

    let Some(snapshot) = state.registry.current() else {
        tracing::trace!(request_id = %request_id, "Mapping registry not initialized");
        return default_response();
    };

    let view = HttpRequestView::new(&parts);
    let matched = match match_request(&snapshot, &route.id, application, &view) {
        MatchOutcome::Matched(matched) => matched,
        MatchOutcome::Excluded => {
            metrics::record_match(&route.id, "excluded");
            tracing::debug!(
                request_id = %request_id,
                route_id = %route.id,
                path = %path,
                "Request excluded from endpoint mapping"
            );
            return default_response();
        }
        MatchOutcome::NoMatch => {
            metrics::record_match(&route.id, "no_match");
            tracing::debug!(
                request_id = %request_id,
                route_id = %route.id,
                path = %path,
                "No endpoint mapping matched"
            );
            return default_response();
        }
    };
    metrics::record_match(&route.id, "matched");

    let instances = match state.directory.instances(application) {
        Ok(instances) => instances,
        Err(error) => {
            tracing::warn!(request_id = %request_id, application = %application, %error, "Instance lookup failed");
            return default_response();
        }
    };
    let Some(instance) = state.chooser.choose(&instances) else {
        tracing::debug!(request_id = %request_id, application = %application, "No instance available");
        return default_response();
    };
    let Some(base_url) = instance.base_url() else {
        tracing::warn!(request_id = %request_id, host = %instance.host, "Instance has no usable base URL");
        return default_response();
    };

    let mut target = format!(
        "{}{}",
        base_url.as_str().trim_end_matches('/'),
        matched.sub_path
    );
    if let Some(query) = parts.uri.query() {
        target.push('?');
        target.push_str(query);
    }
    let Ok(uri) = Uri::from_str(&target) else {
        tracing::warn!(request_id = %request_id, target = %target, "Invalid forward URI");
        return default_response();
    };

    tracing::debug!(
        request_id = %request_id,
        route_id = %route.id,
        endpoint_id = matched.endpoint_id,
        target = %target,
        "Forwarding matched request"
    );

    let mut forward = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .version(parts.version);
    if let Some(headers) = forward.headers_mut() {
        for (name, value) in parts.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Ok(value) = HeaderValue::from_str(&matched.endpoint_id.to_string()) {
            headers.insert(ENDPOINT_ID_HEADER, value);
        }
    }
    let forward = match forward.body(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build forward request");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    match state.client.request(forward).await {
        Ok(response) => {
            metrics::record_forwarded(response.status().as_u16());
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_forwarded(502);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// First non-empty path segment, if any.
fn application_name(path: &str) -> Option<&str> {
    path.split('/').find(|s| !s.is_empty())
}

/// First endpoint-mapped route whose subscribed services cover the
/// application: the `all` wildcard or a comma-list membership.
fn select_route<'a>(
    routes: &'a [RouteDefinition],
    application: &str,
) -> Option<&'a RouteDefinition> {
    routes
        .iter()
        .filter(|r| r.is_endpoint_mapped())
        .find(|r| match r.service_host() {
            Some(host) => {
                host == ALL_SERVICES || host.split(',').any(|s| s.trim() == application)
            }
            None => false,
        })
}

/// The gateway default: exactly what a request gets when this router is
/// absent.
fn default_response() -> Response {
    (StatusCode::NOT_FOUND, "No matching route found").into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_application_name() {
        assert_eq!(application_name("/svc1/hello"), Some("svc1"));
        assert_eq!(application_name("/svc1"), Some("svc1"));
        assert_eq!(application_name("/"), None);
        assert_eq!(application_name(""), None);
    }

    #[test]
    fn test_select_route_wildcard_and_list() {
        let routes = vec![
            RouteDefinition::new("fixed", Url::parse("http://x:1").unwrap()),
            RouteDefinition::new("listed", Url::parse("we://svc-a,svc-b").unwrap()),
            RouteDefinition::new("wild", Url::parse("we://all").unwrap()),
        ];
        assert_eq!(select_route(&routes, "svc-b").unwrap().id, "listed");
        assert_eq!(select_route(&routes, "other").unwrap().id, "wild");
    }
}

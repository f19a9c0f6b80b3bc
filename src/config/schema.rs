//! Configuration schema definitions.
//!
//! This module defines the gateway configuration structure. All types derive
//! Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use url::Url;

/// URI scheme marking a route as endpoint-mapped rather than a fixed backend.
pub const WEB_ENDPOINT_SCHEME: &str = "we";

/// Wildcard host subscribing a route to every known service.
pub const ALL_SERVICES: &str = "all";

/// Property-key prefix covering the route table, used to decide whether a
/// configuration change can affect routing.
pub const ROUTES_PROPERTY_PREFIX: &str = "gateway.routes";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Logical route definitions.
    pub routes: Vec<RouteDefinition>,

    /// Statically declared services, used when no registry client is wired.
    pub services: Vec<ServiceConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// One logical gateway route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteDefinition {
    /// Stable route identifier.
    pub id: String,

    /// Target URI. The `we` scheme marks the route as endpoint-mapped and
    /// its host carries the subscribed services (`all` or a comma list).
    pub uri: Url,

    /// Raw route metadata; the `web-endpoint` sub-key is bound separately.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RouteDefinition {
    pub fn new(id: impl Into<String>, uri: Url) -> Self {
        Self {
            id: id.into(),
            uri,
            metadata: HashMap::new(),
        }
    }

    /// Whether this route is dynamically endpoint-mapped.
    pub fn is_endpoint_mapped(&self) -> bool {
        self.uri.scheme() == WEB_ENDPOINT_SCHEME
    }

    /// The raw subscribed-service host: `all` or a comma-delimited list.
    pub fn service_host(&self) -> Option<&str> {
        self.uri.host_str()
    }
}

/// Statically declared backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name as routes subscribe to it.
    pub name: String,

    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// One statically declared service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    pub host: String,
    pub port: u16,

    #[serde(default)]
    pub secure: bool,

    /// Instance metadata, including the advertised-endpoint JSON.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Supplies the current route table plus property lookups to the refresh
/// controller. Implemented by the live config handle and by test fixtures.
pub trait RouteSource: Send + Sync {
    /// Current route definitions, in declaration order.
    fn routes(&self) -> Vec<RouteDefinition>;

    /// Value of one route-table property key, e.g. `gateway.routes.0.id`.
    fn property(&self, key: &str) -> Option<String>;
}

/// Live config handle shared between the server, the watcher and the
/// refresh controller. Reload swaps the inner `Arc` wholesale.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<GatewayConfig>>,
}

impl SharedConfig {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn load(&self) -> Arc<GatewayConfig> {
        self.inner.load_full()
    }

    pub fn store(&self, config: GatewayConfig) {
        self.inner.store(Arc::new(config));
    }
}

impl RouteSource for SharedConfig {
    fn routes(&self) -> Vec<RouteDefinition> {
        self.load().routes.clone()
    }

    fn property(&self, key: &str) -> Option<String> {
        let rest = key.strip_prefix(ROUTES_PROPERTY_PREFIX)?.strip_prefix('.')?;
        let (index, field) = rest.split_once('.')?;
        let index: usize = index.parse().ok()?;
        let config = self.load();
        let route = config.routes.get(index)?;
        match field {
            "id" => Some(route.id.clone()),
            "uri" => Some(route.uri.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_mapped_route() {
        let route = RouteDefinition::new("r1", Url::parse("we://all").unwrap());
        assert!(route.is_endpoint_mapped());
        assert_eq!(route.service_host(), Some("all"));

        let fixed = RouteDefinition::new("r2", Url::parse("http://backend:8080").unwrap());
        assert!(!fixed.is_endpoint_mapped());
    }

    #[test]
    fn test_comma_delimited_service_host() {
        let route = RouteDefinition::new("r1", Url::parse("we://svc-a,svc-b").unwrap());
        assert_eq!(route.service_host(), Some("svc-a,svc-b"));
    }

    #[test]
    fn test_shared_config_property_lookup() {
        let mut config = GatewayConfig::default();
        config
            .routes
            .push(RouteDefinition::new("we-route", Url::parse("we://all").unwrap()));
        let shared = SharedConfig::new(config);

        assert_eq!(
            shared.property("gateway.routes.0.id"),
            Some("we-route".to_string())
        );
        assert_eq!(shared.property("gateway.routes.1.id"), None);
        assert_eq!(shared.property("unrelated.key"), None);
    }
}

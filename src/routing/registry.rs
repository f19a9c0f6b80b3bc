//! Mapping registry: rebuild, publish, read.
//!
//! # Responsibilities
//! - Rebuild a snapshot from the route table and live service instances
//! - Publish it with a single atomic swap
//! - Serve non-blocking reads to concurrent matchers
//!
//! # Design Decisions
//! - `ArcSwapOption` is the only shared mutable state: readers never lock,
//!   writers build the snapshot in a local structure and store once
//! - `None` before the first publish is the "not yet initialized" sentinel;
//!   the matcher treats it as pass-through
//! - A failing discovery call degrades that service's contribution to
//!   nothing; the rebuild itself always completes

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::{RouteDefinition, WebEndpointConfig, ALL_SERVICES};
use crate::discovery::{endpoints, ServiceDirectory};
use crate::routing::snapshot::{Snapshot, SnapshotBuilder};

/// The core cache: per-route mapping specs, swapped wholesale on refresh.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    current: ArcSwapOption<Snapshot>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from one coherent read of routes and topology.
    /// Pure with respect to the registry: nothing is published here.
    pub fn rebuild(
        &self,
        routes: &[RouteDefinition],
        directory: &dyn ServiceDirectory,
    ) -> Snapshot {
        let mut builder = SnapshotBuilder::new();

        for route in routes.iter().filter(|r| r.is_endpoint_mapped()) {
            let config = WebEndpointConfig::from_metadata(&route.metadata);
            builder.add_route(&route.id, config.exclusion_spec());

            for service in subscribed_services(route, &config, directory) {
                let instances = match directory.instances(&service) {
                    Ok(instances) => instances,
                    Err(error) => {
                        tracing::warn!(
                            route_id = %route.id,
                            service = %service,
                            %error,
                            "Skipping service during rebuild"
                        );
                        continue;
                    }
                };
                for instance in &instances {
                    for endpoint in endpoints::endpoints_of(instance) {
                        builder.add_spec(&route.id, endpoint.to_spec());
                    }
                }
            }
        }

        let snapshot = builder.build();
        tracing::debug!(routes = snapshot.len(), "Rebuilt mapping snapshot");
        snapshot
    }

    /// Atomically replace the visible snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Some(Arc::new(snapshot)));
    }

    /// The latest published snapshot; `None` until the first publish.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Teardown: drop the published snapshot. Readers holding an `Arc`
    /// finish their in-flight match normally.
    pub fn clear(&self) {
        self.current.store(None);
    }
}

/// Resolve the service names a route subscribes to: the `all` wildcard
/// expands to every known service, otherwise the host is a comma list.
/// Excluded services are removed in both cases.
fn subscribed_services(
    route: &RouteDefinition,
    config: &WebEndpointConfig,
    directory: &dyn ServiceDirectory,
) -> Vec<String> {
    let host = route.service_host().unwrap_or_default();
    let names: Vec<String> = if host == ALL_SERVICES {
        match directory.services() {
            Ok(names) => names,
            Err(error) => {
                tracing::warn!(route_id = %route.id, %error, "Service listing failed");
                Vec::new()
            }
        }
    } else {
        host.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };

    names
        .into_iter()
        .filter(|name| !config.excluded_services().contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DiscoveryError, ServiceInstance, WEB_MAPPINGS_METADATA_NAME};
    use serde_json::json;
    use url::Url;

    struct FixedDirectory {
        services: Vec<(String, Vec<ServiceInstance>)>,
    }

    impl ServiceDirectory for FixedDirectory {
        fn services(&self) -> Result<Vec<String>, DiscoveryError> {
            Ok(self.services.iter().map(|(n, _)| n.clone()).collect())
        }

        fn instances(&self, service: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
            Ok(self
                .services
                .iter()
                .find(|(n, _)| n == service)
                .map(|(_, i)| i.clone())
                .unwrap_or_default())
        }
    }

    fn instance(service: &str, mappings: &str) -> ServiceInstance {
        let mut inst = ServiceInstance::new(service, "127.0.0.1", 8080);
        inst.metadata
            .insert(WEB_MAPPINGS_METADATA_NAME.into(), mappings.into());
        inst
    }

    fn we_route(id: &str, host: &str) -> RouteDefinition {
        RouteDefinition::new(id, Url::parse(&format!("we://{host}")).unwrap())
    }

    #[test]
    fn test_rebuild_folds_endpoints_per_route() {
        let directory = FixedDirectory {
            services: vec![(
                "svc1".into(),
                vec![instance(
                    "svc1",
                    r#"[{"id":1,"patterns":["/hello/**"],"methods":["GET"]}]"#,
                )],
            )],
        };
        let registry = MappingRegistry::new();
        let snapshot = registry.rebuild(&[we_route("r1", "all")], &directory);

        let entry = snapshot.route("r1").unwrap();
        assert_eq!(entry.specs().len(), 1);
        assert_eq!(entry.specs()[0].id(), Some(1));
    }

    #[test]
    fn test_wildcard_expansion_minus_excluded() {
        let directory = FixedDirectory {
            services: vec![
                (
                    "svc-x".into(),
                    vec![instance("svc-x", r#"[{"id":1,"patterns":["/x/**"]}]"#)],
                ),
                (
                    "svc-y".into(),
                    vec![instance("svc-y", r#"[{"id":2,"patterns":["/y/**"]}]"#)],
                ),
            ],
        };
        let mut route = we_route("r1", "all");
        route.metadata.insert(
            crate::config::WEB_ENDPOINT_METADATA_KEY.into(),
            json!({ "exclude": { "services": ["svc-x"] } }),
        );

        let registry = MappingRegistry::new();
        let snapshot = registry.rebuild(&[route], &directory);

        let entry = snapshot.route("r1").unwrap();
        assert_eq!(entry.specs().len(), 1);
        assert_eq!(entry.specs()[0].id(), Some(2));
    }

    #[test]
    fn test_non_endpoint_routes_skipped() {
        let directory = FixedDirectory { services: vec![] };
        let registry = MappingRegistry::new();
        let snapshot = registry.rebuild(
            &[RouteDefinition::new(
                "fixed",
                Url::parse("http://backend:8080").unwrap(),
            )],
            &directory,
        );
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_publish_and_clear() {
        let registry = MappingRegistry::new();
        assert!(registry.current().is_none());

        registry.publish(Snapshot::default());
        assert!(registry.current().is_some());

        registry.clear();
        assert!(registry.current().is_none());
    }

    #[test]
    fn test_failing_directory_degrades_to_empty_entry() {
        struct FailingDirectory;
        impl ServiceDirectory for FailingDirectory {
            fn services(&self) -> Result<Vec<String>, DiscoveryError> {
                Err(DiscoveryError::Unavailable("registry down".into()))
            }
            fn instances(&self, service: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
                Err(DiscoveryError::UnknownService(service.into()))
            }
        }

        let registry = MappingRegistry::new();
        let snapshot = registry.rebuild(&[we_route("r1", "all")], &FailingDirectory);
        // The rebuild completes; the route entry simply holds nothing.
        let entry = snapshot.route("r1").unwrap();
        assert!(entry.specs().is_empty());
    }
}

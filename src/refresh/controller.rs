//! Refresh triggers and the rebuild decision.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{RouteSource, ROUTES_PROPERTY_PREFIX};
use crate::discovery::ServiceDirectory;
use crate::observability::metrics;
use crate::routing::MappingRegistry;

/// The closed set of externally observable events that can invalidate the
/// mapping registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshTrigger {
    /// Component fully initialized; always rebuilds.
    Startup,
    /// Configuration changed; carries the changed property keys.
    ConfigChanged { keys: Vec<String> },
    /// Service instances appeared or disappeared; always rebuilds.
    TopologyChanged,
    /// The route table was reloaded from its source.
    RouteTableReloaded { success: bool },
}

impl RefreshTrigger {
    fn name(&self) -> &'static str {
        match self {
            RefreshTrigger::Startup => "startup",
            RefreshTrigger::ConfigChanged { .. } => "config_changed",
            RefreshTrigger::TopologyChanged => "topology_changed",
            RefreshTrigger::RouteTableReloaded { .. } => "route_table_reloaded",
        }
    }
}

/// Listens for refresh triggers and rebuilds the registry at most once per
/// trigger, never partially: the snapshot is built locally and published
/// with one atomic swap.
pub struct RefreshController {
    registry: Arc<MappingRegistry>,
    routes: Arc<dyn RouteSource>,
    directory: Arc<dyn ServiceDirectory>,
}

impl RefreshController {
    pub fn new(
        registry: Arc<MappingRegistry>,
        routes: Arc<dyn RouteSource>,
        directory: Arc<dyn ServiceDirectory>,
    ) -> Self {
        Self {
            registry,
            routes,
            directory,
        }
    }

    /// The single rebuild policy for every trigger kind.
    pub fn decide(&self, trigger: &RefreshTrigger) -> bool {
        match trigger {
            RefreshTrigger::Startup => true,
            RefreshTrigger::TopologyChanged => true,
            RefreshTrigger::RouteTableReloaded { success } => *success,
            RefreshTrigger::ConfigChanged { keys } => self.config_change_affects_routes(keys),
        }
    }

    /// Process one trigger: decide, then rebuild and publish.
    pub fn handle(&self, trigger: RefreshTrigger) {
        if !self.decide(&trigger) {
            tracing::debug!(trigger = trigger.name(), "Skipping registry rebuild");
            return;
        }

        let routes = self.routes.routes();
        let snapshot = self.registry.rebuild(&routes, self.directory.as_ref());
        let route_count = snapshot.len();
        self.registry.publish(snapshot);

        metrics::record_rebuild(trigger.name());
        tracing::info!(
            trigger = trigger.name(),
            routes = route_count,
            "Published mapping snapshot"
        );
    }

    /// Consume triggers until the channel closes.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::UnboundedReceiver<RefreshTrigger>) {
        while let Some(trigger) = triggers.recv().await {
            self.handle(trigger);
        }
    }

    /// Teardown: clear the published snapshot. In-flight matches that
    /// already captured a snapshot reference complete normally.
    pub fn shutdown(&self) {
        self.registry.clear();
        tracing::info!("Mapping registry cleared");
    }

    /// A changed key matters only when it identifies a routed route (an
    /// `.id` key whose value is a known endpoint-mapped route id) or lies
    /// beneath such a route's metadata branch. Anything else would thrash
    /// the registry on every unrelated environment mutation.
    fn config_change_affects_routes(&self, keys: &[String]) -> bool {
        let routes = self.routes.routes();
        let is_routed_id = |id: &str| {
            routes
                .iter()
                .any(|route| route.is_endpoint_mapped() && route.id == id)
        };

        for key in keys {
            let Some(rest) = key
                .strip_prefix(ROUTES_PROPERTY_PREFIX)
                .and_then(|r| r.strip_prefix('.'))
            else {
                continue;
            };

            if key.ends_with(".id") {
                if let Some(value) = self.routes.property(key) {
                    if is_routed_id(&value) {
                        return true;
                    }
                }
                continue;
            }

            // A key under gateway.routes.<n>.metadata...: resolve the
            // sibling id property to see whose metadata changed.
            if let Some((index, field)) = rest.split_once('.') {
                if field == "metadata" || field.starts_with("metadata.") {
                    let id_key = format!("{ROUTES_PROPERTY_PREFIX}.{index}.id");
                    if let Some(value) = self.routes.property(&id_key) {
                        if is_routed_id(&value) {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }
}

//! Immutable registry snapshots.
//!
//! # Responsibilities
//! - Hold per-route mapping specs and the optional exclusion spec
//! - Deduplicate value-identical specs while preserving declaration order
//!
//! # Design Decisions
//! - A snapshot is built entirely off to the side and never mutated after
//!   publication; readers share it through an `Arc`
//! - Equality derives from spec value-equality, which backs the
//!   idempotent-rebuild guarantee

use std::collections::{HashMap, HashSet};

use crate::mapping::MappingSpec;

/// The mapping state of one logical route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMappings {
    specs: Vec<MappingSpec>,
    exclusion: Option<MappingSpec>,
}

impl RouteMappings {
    pub fn new(exclusion: Option<MappingSpec>) -> Self {
        Self {
            specs: Vec::new(),
            exclusion,
        }
    }

    /// Candidate specs in declaration order, already deduplicated.
    pub fn specs(&self) -> &[MappingSpec] {
        &self.specs
    }

    /// The route's exclusion spec, if configured.
    pub fn exclusion(&self) -> Option<&MappingSpec> {
        self.exclusion.as_ref()
    }

    fn push_deduped(&mut self, spec: MappingSpec, seen: &mut HashSet<MappingSpec>) {
        // Identical specs from different instances of one logical endpoint
        // carry the same endpoint id; the first writer wins.
        if seen.insert(spec.clone()) {
            self.specs.push(spec);
        }
    }
}

/// One fully built generation of the mapping registry.
#[derive(Debug, Default, PartialEq)]
pub struct Snapshot {
    routes: HashMap<String, RouteMappings>,
}

impl Snapshot {
    /// Entry for a logical route id, if the route is endpoint-mapped.
    pub fn route(&self, route_id: &str) -> Option<&RouteMappings> {
        self.routes.get(route_id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Accumulates one snapshot during a rebuild.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    routes: HashMap<String, RouteMappings>,
    seen: HashMap<String, HashSet<MappingSpec>>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route entry. An entry exists even when no instance
    /// advertises anything, so lookups can tell "empty" from "not routed".
    pub fn add_route(&mut self, route_id: &str, exclusion: Option<MappingSpec>) {
        self.routes
            .insert(route_id.to_string(), RouteMappings::new(exclusion));
        self.seen.insert(route_id.to_string(), HashSet::new());
    }

    /// Fold one advertised spec into a route's entry.
    pub fn add_spec(&mut self, route_id: &str, spec: MappingSpec) {
        if let (Some(entry), Some(seen)) =
            (self.routes.get_mut(route_id), self.seen.get_mut(route_id))
        {
            entry.push_deduped(spec, seen);
        }
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            routes: self.routes,
        }
    }
}

//! Per-route endpoint-mapping configuration bound from route metadata.
//!
//! # Responsibilities
//! - Flatten the nested `web-endpoint` metadata branch into dotted keys
//! - Bind flat keys into typed fields, one field at a time
//! - Build the route's exclusion spec
//!
//! # Design Decisions
//! - Binding is tolerant: a malformed field is logged at debug and dropped,
//!   the remaining fields still bind and the route still gets a config
//! - Parsed once per refresh cycle, immutable afterwards, replaced wholesale

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::mapping::{HttpMethod, MappingSpec};

/// Route metadata sub-key holding the endpoint-mapping configuration.
pub const WEB_ENDPOINT_METADATA_KEY: &str = "web-endpoint";

/// Typed per-route configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebEndpointConfig {
    excluded_services: HashSet<String>,
    exclude_patterns: Vec<String>,
    exclude_methods: Vec<HttpMethod>,
}

impl WebEndpointConfig {
    /// Bind from a route's raw metadata map. Missing or partially malformed
    /// metadata yields a config with the affected fields defaulted.
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Self {
        let Some(branch) = metadata.get(WEB_ENDPOINT_METADATA_KEY) else {
            return Self::default();
        };

        let mut flat = BTreeMap::new();
        flatten(branch, "", &mut flat);

        let excluded_services = collect_strings(&flat, "exclude.services")
            .into_iter()
            .collect();
        let exclude_patterns = collect_strings(&flat, "exclude.patterns");
        let exclude_methods = collect_strings(&flat, "exclude.methods")
            .iter()
            .filter_map(|name| {
                let parsed = HttpMethod::parse(name);
                if parsed.is_none() {
                    tracing::debug!(method = %name, "Dropping unknown exclude method");
                }
                parsed
            })
            .collect();

        Self {
            excluded_services,
            exclude_patterns,
            exclude_methods,
        }
    }

    /// Service names never subscribed, even when nominally in scope.
    pub fn excluded_services(&self) -> &HashSet<String> {
        &self.excluded_services
    }

    /// The single exclusion spec, absent when no patterns are configured.
    pub fn exclusion_spec(&self) -> Option<MappingSpec> {
        if self.exclude_patterns.is_empty() {
            return None;
        }
        Some(
            MappingSpec::new(&self.exclude_patterns)
                .methods(self.exclude_methods.iter().copied()),
        )
    }
}

/// Flatten nested maps and arrays into dotted / indexed keys:
/// `{exclude: {patterns: ["/a"]}}` becomes `exclude.patterns.0 = "/a"`.
fn flatten(value: &Value, prefix: &str, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = join(prefix, key);
                flatten(nested, &path, out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                let path = join(prefix, &index.to_string());
                flatten(nested, &path, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Gather the string leaves under one field, tolerating a scalar value in
/// place of a list. Non-string leaves are logged and dropped.
fn collect_strings(flat: &BTreeMap<String, Value>, field: &str) -> Vec<String> {
    let indexed_prefix = format!("{field}.");
    flat.iter()
        .filter(|(key, _)| *key == field || key.starts_with(&indexed_prefix))
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some(s.clone()),
            other => {
                tracing::debug!(key = %key, value = %other, "Dropping malformed metadata field");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert(WEB_ENDPOINT_METADATA_KEY.to_string(), value);
        map
    }

    #[test]
    fn test_missing_branch_defaults() {
        let config = WebEndpointConfig::from_metadata(&HashMap::new());
        assert!(config.excluded_services().is_empty());
        assert!(config.exclusion_spec().is_none());
    }

    #[test]
    fn test_full_binding() {
        let config = WebEndpointConfig::from_metadata(&metadata(json!({
            "exclude": {
                "services": ["svc-x"],
                "patterns": ["/internal/**"],
                "methods": ["GET", "POST"],
            }
        })));
        assert!(config.excluded_services().contains("svc-x"));
        let spec = config.exclusion_spec().unwrap();
        assert_eq!(spec.pattern_strings(), vec!["/internal/**"]);
    }

    #[test]
    fn test_malformed_field_does_not_abort_binding() {
        // `services` holds a number; patterns must still bind.
        let config = WebEndpointConfig::from_metadata(&metadata(json!({
            "exclude": {
                "services": [42],
                "patterns": ["/internal/**"],
            }
        })));
        assert!(config.excluded_services().is_empty());
        assert!(config.exclusion_spec().is_some());
    }

    #[test]
    fn test_unknown_method_dropped() {
        let config = WebEndpointConfig::from_metadata(&metadata(json!({
            "exclude": {
                "patterns": ["/x"],
                "methods": ["BREW", "GET"],
            }
        })));
        // The spec is still built with the valid methods.
        assert!(config.exclusion_spec().is_some());
    }

    #[test]
    fn test_scalar_in_place_of_list() {
        let config = WebEndpointConfig::from_metadata(&metadata(json!({
            "exclude": { "patterns": "/solo/**" }
        })));
        let spec = config.exclusion_spec().unwrap();
        assert_eq!(spec.pattern_strings(), vec!["/solo/**"]);
    }
}

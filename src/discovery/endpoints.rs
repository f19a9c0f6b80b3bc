//! Advertised endpoint decoding.
//!
//! Service instances publish the endpoints they serve as a JSON array under
//! one well-known metadata key. A missing key means the instance advertises
//! nothing; a malformed value is logged and likewise contributes nothing.

use serde::Deserialize;

use crate::discovery::directory::ServiceInstance;
use crate::mapping::{HttpMethod, MappingSpec};

/// Instance metadata key holding the advertised endpoint array.
pub const WEB_MAPPINGS_METADATA_NAME: &str = "web-mappings";

/// One endpoint as advertised by a backend instance.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvertisedEndpoint {
    pub id: i64,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub methods: Vec<HttpMethod>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
}

impl AdvertisedEndpoint {
    /// Compile into a matching rule carrying the endpoint id.
    pub fn to_spec(&self) -> MappingSpec {
        MappingSpec::new(&self.patterns)
            .methods(self.methods.iter().copied())
            .params(&self.params)
            .headers(&self.headers)
            .consumes(&self.consumes)
            .produces(&self.produces)
            .endpoint_id(self.id)
    }
}

/// Decode the endpoints advertised by one instance.
pub fn endpoints_of(instance: &ServiceInstance) -> Vec<AdvertisedEndpoint> {
    let Some(raw) = instance.metadata.get(WEB_MAPPINGS_METADATA_NAME) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<AdvertisedEndpoint>>(raw) {
        Ok(endpoints) => endpoints,
        Err(error) => {
            tracing::warn!(
                service = %instance.service_id,
                host = %instance.host,
                %error,
                "Discarding malformed advertised endpoints"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with(mappings: &str) -> ServiceInstance {
        let mut inst = ServiceInstance::new("svc1", "127.0.0.1", 8080);
        inst.metadata
            .insert(WEB_MAPPINGS_METADATA_NAME.into(), mappings.into());
        inst
    }

    #[test]
    fn test_decode_endpoints() {
        let inst = instance_with(
            r#"[{"id":1,"patterns":["/hello/**"],"methods":["GET"]},
                {"id":2,"patterns":["/admin"],"methods":["POST"],"consumes":["application/json"]}]"#,
        );
        let endpoints = endpoints_of(&inst);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].id, 1);
        assert_eq!(endpoints[1].consumes, vec!["application/json"]);
    }

    #[test]
    fn test_missing_metadata_is_empty() {
        let inst = ServiceInstance::new("svc1", "127.0.0.1", 8080);
        assert!(endpoints_of(&inst).is_empty());
    }

    #[test]
    fn test_malformed_metadata_is_empty() {
        let inst = instance_with("{not json");
        assert!(endpoints_of(&inst).is_empty());
    }

    #[test]
    fn test_to_spec_carries_id() {
        let inst = instance_with(r#"[{"id":7,"patterns":["/x/**"]}]"#);
        let spec = endpoints_of(&inst)[0].to_spec();
        assert_eq!(spec.id(), Some(7));
    }
}

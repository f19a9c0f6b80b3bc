//! Service directory trait and instance model.

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

/// Metadata key carrying an instance's servlet-style context path, honored
/// when the forward URL is built.
pub const WEB_CONTEXT_PATH_METADATA_NAME: &str = "web-context-path";

/// Failure talking to the service registry. Callers absorb these and
/// degrade to "no contribution"; they never surface on the request path.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("service registry unavailable: {0}")]
    Unavailable(String),

    #[error("unknown service '{0}'")]
    UnknownService(String),
}

/// One live instance of a backend service.
#[derive(Debug, Clone)]
pub struct ServiceInstance {
    pub service_id: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub metadata: HashMap<String, String>,
}

impl ServiceInstance {
    pub fn new(service_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service_id: service_id.into(),
            host: host.into(),
            port,
            secure: false,
            metadata: HashMap::new(),
        }
    }

    /// Base URL for forwarding, including the instance's context path
    /// when its metadata declares one.
    pub fn base_url(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let context_path = self
            .metadata
            .get(WEB_CONTEXT_PATH_METADATA_NAME)
            .map(|p| p.trim_end_matches('/'))
            .unwrap_or("");
        Url::parse(&format!(
            "{}://{}:{}{}",
            scheme, self.host, self.port, context_path
        ))
        .ok()
    }
}

/// Read access to the service registry.
pub trait ServiceDirectory: Send + Sync {
    /// All currently known service names.
    fn services(&self) -> Result<Vec<String>, DiscoveryError>;

    /// Live instances for one service; empty is a valid answer.
    fn instances(&self, service: &str) -> Result<Vec<ServiceInstance>, DiscoveryError>;
}

/// Directory backed by statically configured services. Stands in for a
/// registry client in small deployments and in tests.
#[derive(Debug, Default)]
pub struct StaticServiceDirectory {
    services: Vec<(String, Vec<ServiceInstance>)>,
}

impl StaticServiceDirectory {
    pub fn from_config(services: &[crate::config::ServiceConfig]) -> Self {
        let services = services
            .iter()
            .map(|svc| {
                let instances = svc
                    .instances
                    .iter()
                    .map(|inst| ServiceInstance {
                        service_id: svc.name.clone(),
                        host: inst.host.clone(),
                        port: inst.port,
                        secure: inst.secure,
                        metadata: inst.metadata.clone(),
                    })
                    .collect();
                (svc.name.clone(), instances)
            })
            .collect();
        Self { services }
    }
}

impl ServiceDirectory for StaticServiceDirectory {
    fn services(&self) -> Result<Vec<String>, DiscoveryError> {
        Ok(self.services.iter().map(|(name, _)| name.clone()).collect())
    }

    fn instances(&self, service: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self
            .services
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, instances)| instances.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let inst = ServiceInstance::new("svc1", "10.0.0.5", 8080);
        assert_eq!(inst.base_url().unwrap().as_str(), "http://10.0.0.5:8080/");
    }

    #[test]
    fn test_base_url_secure_with_context_path() {
        let mut inst = ServiceInstance::new("svc1", "10.0.0.5", 8443);
        inst.secure = true;
        inst.metadata
            .insert(WEB_CONTEXT_PATH_METADATA_NAME.into(), "/app/".into());
        assert_eq!(
            inst.base_url().unwrap().as_str(),
            "https://10.0.0.5:8443/app"
        );
    }
}

//! Endpoint-Mapping Gateway Router Library

pub mod config;
pub mod discovery;
pub mod forward;
pub mod http;
pub mod mapping;
pub mod observability;
pub mod refresh;
pub mod routing;

pub use config::{GatewayConfig, SharedConfig};
pub use http::GatewayServer;
pub use refresh::{RefreshController, RefreshTrigger};
pub use routing::MappingRegistry;

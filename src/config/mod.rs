//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → GatewayConfig (immutable)
//!     → shared via SharedConfig (atomic Arc swap) to all subsystems
//!
//! Per endpoint-mapped route:
//!     route metadata["web-endpoint"]
//!     → metadata.rs (flatten + tolerant per-field bind)
//!     → WebEndpointConfig (exclusions, excluded services)
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → SharedConfig swap + RouteTableReloaded trigger to the
//!       refresh controller (success flag decides whether to rebuild)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Metadata binding never fails a route: malformed fields are dropped

pub mod loader;
pub mod metadata;
pub mod schema;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use metadata::{WebEndpointConfig, WEB_ENDPOINT_METADATA_KEY};
pub use schema::{
    GatewayConfig, InstanceConfig, ListenerConfig, RouteDefinition, RouteSource, ServiceConfig,
    SharedConfig, ALL_SERVICES, ROUTES_PROPERTY_PREFIX, WEB_ENDPOINT_SCHEME,
};
pub use watcher::ConfigWatcher;

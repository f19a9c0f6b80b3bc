//! Service discovery collaborators.
//!
//! # Data Flow
//! ```text
//! ServiceDirectory (registry client, external)
//!     → directory.rs (trait + instance model)
//!     → endpoints.rs (decode advertised endpoints from instance metadata)
//!     → routing registry (folds endpoints into mapping specs)
//! ```
//!
//! # Design Decisions
//! - The router never implements discovery itself; it consumes a narrow
//!   trait so registries (or test fixtures) plug in behind it
//! - A failing lookup degrades that one service's contribution to nothing;
//!   it never aborts a rebuild or reaches the request path

pub mod directory;
pub mod endpoints;

pub use directory::{
    DiscoveryError, ServiceDirectory, ServiceInstance, StaticServiceDirectory,
};
pub use endpoints::{AdvertisedEndpoint, WEB_MAPPINGS_METADATA_NAME};

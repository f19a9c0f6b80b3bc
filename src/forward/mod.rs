//! Instance selection for forwarding.
//!
//! # Data Flow
//! ```text
//! Route matched → application name identified
//!     → InstanceChooser picks one live instance
//!     → http surface rewrites the URI and hands the request off
//! ```
//!
//! # Design Decisions
//! - Selection policy is a collaborator concern behind a narrow trait; the
//!   router only attaches the endpoint id and the rewritten path
//! - Round robin is the default; anything smarter plugs in behind the trait

pub mod round_robin;

use crate::discovery::ServiceInstance;

pub use round_robin::RoundRobin;

/// Picks one instance out of a service's live set.
pub trait InstanceChooser: Send + Sync {
    /// Returns `None` when no instance is available.
    fn choose(&self, instances: &[ServiceInstance]) -> Option<ServiceInstance>;
}

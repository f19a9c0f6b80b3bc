//! Endpoint mapping rules.
//!
//! # Data Flow
//! ```text
//! AdvertisedEndpoint (from instance metadata)
//!     → spec.rs (compile into MappingSpec)
//!     → pattern.rs (glob path patterns)
//!     → condition.rs (param/header expressions, media types)
//!     → Evaluated per request by the routing matcher
//! ```
//!
//! # Design Decisions
//! - Specs are immutable once compiled
//! - Value equality excludes the endpoint id, so identical specs advertised
//!   by multiple instances of one logical endpoint collapse to a single entry
//! - Matching is pure: no shared state, no allocation beyond segment splits
//! - Deterministic specificity ordering; ties keep declaration order

pub mod condition;
pub mod method;
pub mod pattern;
pub mod spec;

pub use condition::{MediaType, NameValueExpr};
pub use method::HttpMethod;
pub use pattern::PathPattern;
pub use spec::{MappingSpec, RequestView};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Refresh trigger
//!     → registry.rs (rebuild from routes + live instances)
//!     → snapshot.rs (immutable per-route spec collections)
//!     → atomic publish (arc-swap)
//!
//! Incoming Request (route id, application name, RequestView)
//!     → matcher.rs (exclusion veto, sub-path, specificity ranking)
//!     → Return: Matched { endpoint id, rewritten path }, Excluded, or NoMatch
//! ```
//!
//! # Design Decisions
//! - The registry is rebuilt wholesale and swapped atomically; it is never
//!   mutated in place under readers
//! - Matching reads one snapshot reference for its whole duration, so a
//!   concurrent rebuild can never interleave old and new entries
//! - Explicit outcomes (matched, excluded, no-match) rather than silent
//!   default: the caller owns the pass-through behavior and can report
//!   each outcome on its own

pub mod matcher;
pub mod registry;
pub mod snapshot;

pub use matcher::{match_request, MatchOutcome, RouteMatch};
pub use registry::MappingRegistry;
pub use snapshot::{RouteMappings, Snapshot, SnapshotBuilder};

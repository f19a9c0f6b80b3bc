//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured tracing events (route id, application, outcome)
//!     → metrics.rs (match / rebuild counters)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Matcher internals log at trace, refresh decisions at debug/info
//! - Counter updates are cheap; the exporter is opt-in via config

pub mod metrics;

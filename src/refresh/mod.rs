//! Registry refresh subsystem.
//!
//! # Data Flow
//! ```text
//! Startup / config change / topology change / route-table reload
//!     → RefreshTrigger (closed variant set)
//!     → controller.rs decide() — the single "should I rebuild" predicate
//!     → registry rebuild + atomic publish (at most once per trigger)
//! ```
//!
//! # Design Decisions
//! - One decision point for all trigger kinds instead of per-event policy
//! - No debouncing: each trigger recomputes at most once, and concurrent
//!   rebuilds stay correct because each builds locally before publishing
//! - Config changes rebuild only when a changed key can actually affect a
//!   routed route's identity or metadata

pub mod controller;

pub use controller::{RefreshController, RefreshTrigger};

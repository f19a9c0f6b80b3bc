//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, proxy handler)
//!     → request.rs (request ID, RequestView adapter)
//!     → routing matcher decides endpoint + rewritten path
//!     → instance chosen, endpoint-id header attached
//!     → forwarded via hyper client
//! ```
//!
//! This is one integration surface over the routing core; alternative
//! HTTP stacks implement the same `RequestView` seam and reuse the rest.

pub mod request;
pub mod server;

/// Header carrying the matched endpoint id to the backend.
pub const ENDPOINT_ID_HEADER: &str = "x-web-endpoint-id";

pub use request::{HttpRequestView, RequestIdLayer, X_REQUEST_ID};
pub use server::GatewayServer;

//! HTTP API surface.
//!
//! Exposes the alert service as REST endpoints for the mobile apps,
//! plus a WebSocket change feed. Routes are nested under `/api/` and
//! protected by bearer-session middleware; `/ws/connect` authenticates
//! with a one-time ticket instead.
//!
//! The router is composable — `api_router()` returns a `Router` that
//! can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;

pub use router::api_router;
pub use server::{start_server, ApiServer};
pub use types::ApiContext;

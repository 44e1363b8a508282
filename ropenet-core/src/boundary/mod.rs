//! Boundary API
//!
//! A small HTTP surface over the same authoritative store the interactive
//! session uses. Every request names its instance with `instanceId` and goes
//! through the instance-addressed store actions, so it never reads or
//! changes the signed-in user or the active instance.

pub mod api;
pub mod handlers;
pub mod server;
pub mod types;

pub use api::build_router;
pub use handlers::ApiError;
pub use server::BoundaryServer;

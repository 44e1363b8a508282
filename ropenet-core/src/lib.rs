//! ropenet core
//!
//! Multi-instance social state: an in-memory store partitioned by instance,
//! the follow graph, nested reply trees, a background notification
//! generator and a small HTTP boundary over the same data.

pub mod boundary;
pub mod config;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod social;
pub mod store;

pub use config::Config;
pub use logging::{init_logging, LogLevel};
pub use store::{SocialStore, StoreError, StoreHandle, StoreResult};

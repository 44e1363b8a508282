//! Social-state store
//!
//! The single in-memory authority for users, threads, reply trees, the
//! follow graph, notifications and feature toggles of every instance.
//!
//! [`SocialStore`] is a plain single-writer value; [`StoreHandle`] shares it
//! between tasks and owns the notification generator.

pub mod allocator;
pub mod clock;
mod content;
pub mod errors;
pub mod events;
pub mod handle;
mod inbox;
pub mod input;
pub mod partition;
mod profile;
pub mod registry;
pub mod seed;
pub mod session;
pub mod social_store;

pub use allocator::IdAllocator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ErrorKind, Outcome, StoreError, StoreResult};
pub use events::{Change, EventBroadcaster, StoreEvent};
pub use handle::StoreHandle;
pub use input::{NewReply, NewThread, Registration};
pub use partition::{CheckInRecord, Partition};
pub use registry::{Instance, InstanceInfo, InstanceRegistry};
pub use session::{Selection, Session, Theme, View};
pub use social_store::{Snapshot, SocialStore};

//! Entity model: users, threads, replies, messages, notifications and the
//! process-wide catalogs.

pub mod catalog;
pub mod message;
pub mod thread;
pub mod types;
pub mod user;

pub use catalog::{Achievement, Plugin};
pub use message::{Message, NewNotification, Notification, NotificationKind};
pub use thread::{MissionDetails, ParentRef, Reply, ReplyView, Subtask, Thread, ThreadKind, ThreadView};
pub use types::{
    AchievementId, EntityId, InstanceId, MessageId, NotificationId, ReplyId, ThreadId, Timestamp,
    UserId,
};
pub use user::{Faction, User, UserStatus, EXPERIENCE_PER_LEVEL};

//! Store change events
//!
//! Every applied mutation emits one [`StoreEvent`] so the presentation layer
//! can re-render. Events are emitted after the state change is complete.

use crate::model::{EntityId, InstanceId, NotificationId, ParentRef, ReplyId, ThreadId, UserId};
use crate::social::FollowChange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What changed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    InstanceSwitched { from: InstanceId, to: InstanceId },

    SignedIn { user_id: UserId },

    SignedOut { user_id: UserId },

    UserRegistered { user_id: UserId },

    /// View, selection or theme changed
    SessionUpdated,

    ThreadCreated { thread_id: ThreadId },

    ReplyCreated { thread_id: ThreadId, reply_id: ReplyId, parent: ParentRef },

    ReactionChanged { thread_id: ThreadId, target: EntityId, likes: u64, dislikes: u64 },

    Reposted { thread_id: ThreadId, reposts: u64 },

    FollowToggled { follower: UserId, followee: UserId, direction: FollowChange },

    CheckedIn { user_id: UserId, day: NaiveDate, streak: u32 },

    ProfileUpdated { user_id: UserId },

    MissionUpdated { thread_id: ThreadId },

    PluginToggled { plugin_id: String, enabled: bool },

    NotificationAdded { notification_id: NotificationId },

    NotificationRead { notification_id: NotificationId },

    MessageSent { message_id: EntityId },

    MessagesRead { sender_id: UserId, count: usize },

    TornDown,
}

/// One applied mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Store version after the mutation; strictly increasing
    pub version: u64,
    /// Instance the mutation applied to
    pub instance: InstanceId,
    #[serde(flatten)]
    pub change: Change,
}

/// Fan-out of store events to any number of subscribers.
///
/// Slow subscribers lag and skip events rather than blocking the writer.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBroadcaster {
    /// Create a broadcaster buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event; returns how many subscribers received it
    pub fn emit(&self, event: StoreEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

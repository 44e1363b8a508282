//! Direct messages and notifications.
//!
//! Both carry a `read` flag that only ever goes from false to true; the field
//! is private and the only writer is `mark_read`.

use super::types::{MessageId, NotificationId, ThreadId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A direct message between two users of the same instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: Timestamp,
    read: bool,
}

impl Message {
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        timestamp: Timestamp,
    ) -> Self {
        Self { id, sender_id, receiver_id, content, timestamp, read: false }
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Returns true if the flag changed
    pub(crate) fn mark_read(&mut self) -> bool {
        !std::mem::replace(&mut self.read, true)
    }

    /// Whether this message was exchanged between `a` and `b`, either direction
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b) || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reply,
    Message,
    Mission,
    System,
    Achievement,
}

/// An event surfaced to the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub content: String,
    pub timestamp: Timestamp,
    read: bool,
    pub thread_id: Option<ThreadId>,
    pub sender_id: Option<UserId>,
}

impl Notification {
    pub(crate) fn from_input(id: NotificationId, input: NewNotification, timestamp: Timestamp) -> Self {
        Self {
            id,
            kind: input.kind,
            content: input.content,
            timestamp,
            read: false,
            thread_id: input.thread_id,
            sender_id: input.sender_id,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Returns true if the flag changed
    pub(crate) fn mark_read(&mut self) -> bool {
        !std::mem::replace(&mut self.read, true)
    }
}

/// Input for `add_notification`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub content: String,
    pub thread_id: Option<ThreadId>,
    pub sender_id: Option<UserId>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, content: impl Into<String>) -> Self {
        Self { kind, content: content.into(), thread_id: None, sender_id: None }
    }

    pub fn about_thread(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn from_sender(mut self, sender_id: UserId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityId;

    #[test]
    fn test_mark_read_reports_first_transition_only() {
        let mut n = Notification::from_input(
            EntityId(1),
            NewNotification::new(NotificationKind::System, "hi"),
            Timestamp::from_millis(0),
        );
        assert!(!n.is_read());
        assert!(n.mark_read());
        assert!(!n.mark_read());
        assert!(n.is_read());
    }

    #[test]
    fn test_message_is_between_either_direction() {
        let m = Message::new(EntityId(9), EntityId(1), EntityId(2), "yo".into(), Timestamp::from_millis(0));
        assert!(m.is_between(EntityId(1), EntityId(2)));
        assert!(m.is_between(EntityId(2), EntityId(1)));
        assert!(!m.is_between(EntityId(1), EntityId(3)));
    }

    #[test]
    fn test_notification_json_uses_type_key() {
        let n = Notification::from_input(
            EntityId(4),
            NewNotification::new(NotificationKind::Mission, "new mission").about_thread(EntityId(10)),
            Timestamp::from_millis(1),
        );
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "mission");
        assert_eq!(json["read"], false);
        assert_eq!(json["threadId"], 10);
    }
}

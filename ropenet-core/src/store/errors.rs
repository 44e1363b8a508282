//! Error types for store operations

use crate::model::{EntityId, InstanceId, ReplyId, ThreadId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by mutation actions and reads.
///
/// Every error is raised before the action touches state, so a failed call
/// never leaves a partial update behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),

    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),

    #[error("Reply {reply} not found under thread {thread}")]
    ReplyNotFound { thread: ThreadId, reply: ReplyId },

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// No user of the instance has this username or email
    #[error("No user matches '{0}'")]
    UnknownIdentifier(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(EntityId),

    #[error("Achievement not found: {0}")]
    AchievementNotFound(EntityId),

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Subtask {subtask} not found on mission {thread}")]
    SubtaskNotFound { thread: ThreadId, subtask: EntityId },

    /// The action needs a signed-in user
    #[error("No user is signed in")]
    NotAuthenticated,

    /// The signed-in user may not perform the action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The request would break a store invariant, e.g. a cross-instance reference
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The store has been torn down
    #[error("Store is closed")]
    Closed,
}

/// Coarse classification of [`StoreError`], used by the boundary to pick a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthenticated,
    Invariant,
    Unavailable,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::InstanceNotFound(_)
            | StoreError::ThreadNotFound(_)
            | StoreError::ReplyNotFound { .. }
            | StoreError::UserNotFound(_)
            | StoreError::UnknownIdentifier(_)
            | StoreError::NotificationNotFound(_)
            | StoreError::AchievementNotFound(_)
            | StoreError::PluginNotFound(_)
            | StoreError::SubtaskNotFound { .. } => ErrorKind::NotFound,
            StoreError::NotAuthenticated | StoreError::PermissionDenied(_) => {
                ErrorKind::Unauthenticated
            }
            StoreError::InvariantViolation(_) => ErrorKind::Invariant,
            StoreError::Closed => ErrorKind::Unavailable,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// What a successful action did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// State changed and subscribers were notified
    Applied,
    /// The call was valid but the state already matched, e.g. a repeated mark-as-read
    Unchanged,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::ReplyNotFound { thread: EntityId(1), reply: EntityId(2) };
        assert_eq!(err.to_string(), "Reply 2 not found under thread 1");

        let err = StoreError::InstanceNotFound(InstanceId::new("nowhere"));
        assert_eq!(err.to_string(), "Instance not found: nowhere");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(StoreError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(StoreError::ThreadNotFound(EntityId(3)).kind(), ErrorKind::NotFound);
        assert!(StoreError::PluginNotFound("weather".into()).is_not_found());
        assert_eq!(StoreError::NotAuthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(StoreError::InvariantViolation("x".into()).kind(), ErrorKind::Invariant);
        assert_eq!(StoreError::Closed.kind(), ErrorKind::Unavailable);
    }
}

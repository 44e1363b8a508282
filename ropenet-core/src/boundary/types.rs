//! Request/Response types for the boundary API

use crate::model::{EntityId, InstanceId, ThreadView, User};
use crate::store::InstanceInfo;
use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub instance_id: InstanceId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

// ============================================================================
// Note Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesQuery {
    pub instance_id: Option<InstanceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub instance_id: InstanceId,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    pub author_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub instance_id: InstanceId,
    pub content: String,
    pub author_id: EntityId,
    #[serde(default)]
    pub parent_reply_id: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub instance_id: InstanceId,
}

/// A thread with its reply tree and its author embedded
#[derive(Debug, Clone, Serialize)]
pub struct NoteResponse {
    #[serde(flatten)]
    pub thread: ThreadView,
    pub user: Option<User>,
}

// ============================================================================
// Instance Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceListResponse {
    pub instances: Vec<InstanceInfo>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

//! Inputs accepted by mutation actions.
//!
//! Each input knows how to validate itself; actions call `validate` before
//! they look at the store.

use crate::model::{Faction, MissionDetails, ThreadKind, UserId};
use crate::store::errors::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Upper bound on any free-text field
pub const MAX_CONTENT_LEN: usize = 20_000;

fn require_text(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > MAX_CONTENT_LEN {
        return Err(StoreError::Validation(format!(
            "{field} exceeds {MAX_CONTENT_LEN} bytes"
        )));
    }
    Ok(())
}

/// Input for `create_thread`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    #[serde(default)]
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: ThreadKind,
    #[serde(default)]
    pub mission_details: Option<MissionDetails>,
}

impl NewThread {
    /// A plain post
    pub fn post(author_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author_id,
            tags: Vec::new(),
            kind: ThreadKind::Post,
            mission_details: None,
        }
    }

    /// A mission carrying `details`
    pub fn mission(
        author_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
        details: MissionDetails,
    ) -> Self {
        Self {
            kind: ThreadKind::Mission,
            mission_details: Some(details),
            ..Self::post(author_id, title, content)
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        require_text("content", &self.content)?;
        if self.title.len() > MAX_CONTENT_LEN {
            return Err(StoreError::Validation("title is too long".to_string()));
        }
        match (self.kind, &self.mission_details) {
            (ThreadKind::Mission, None) => Err(StoreError::Validation(
                "mission threads need mission details".to_string(),
            )),
            (ThreadKind::Post, Some(_)) => Err(StoreError::Validation(
                "only mission threads carry mission details".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Input for `create_reply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub content: String,
    pub author_id: UserId,
}

impl NewReply {
    pub fn new(author_id: UserId, content: impl Into<String>) -> Self {
        Self { content: content.into(), author_id }
    }

    pub fn validate(&self) -> StoreResult<()> {
        require_text("content", &self.content)
    }
}

/// Input for `register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub faction: Option<Faction>,
}

impl Registration {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            phone: None,
            avatar_url: String::new(),
            bio: String::new(),
            faction: None,
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        require_text("username", &self.username)?;
        require_text("email", &self.email)?;
        if self.username.chars().any(char::is_whitespace) {
            return Err(StoreError::Validation("username must not contain whitespace".to_string()));
        }
        let (local, domain) = self
            .email
            .split_once('@')
            .ok_or_else(|| StoreError::Validation("email must contain '@'".to_string()))?;
        if local.is_empty() || domain.is_empty() {
            return Err(StoreError::Validation("email is malformed".to_string()));
        }
        Ok(())
    }
}

//! User profiles

use super::types::{AchievementId, Timestamp, UserId};
use crate::social::FollowEdges;
use serde::{Deserialize, Serialize};

/// Experience needed per level
pub const EXPERIENCE_PER_LEVEL: u64 = 1000;

/// Presence status shown next to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Away,
    Offline,
    Busy,
}

/// Guild a user can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Development,
    Story,
    Art,
    Freelancer,
}

impl Faction {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "development" => Some(Faction::Development),
            "story" => Some(Faction::Story),
            "art" => Some(Faction::Art),
            "freelancer" => Some(Faction::Freelancer),
            _ => None,
        }
    }
}

/// A user of one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: String,
    pub reputation: i64,
    pub status: UserStatus,
    pub title: String,
    pub bio: String,
    pub faction: Option<Faction>,
    pub badges: Vec<String>,
    pub is_admin: bool,
    pub last_online: Timestamp,
    pub unlocked_achievements: Vec<AchievementId>,
    pub level: u32,
    pub experience: u64,
    pub equipped_achievement: Option<String>,
    #[serde(flatten)]
    graph: FollowEdges,
}

impl User {
    /// Create an offline user with empty profile fields and no follow edges
    pub fn new(id: UserId, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            phone: None,
            avatar_url: String::new(),
            reputation: 0,
            status: UserStatus::Offline,
            title: String::new(),
            bio: String::new(),
            faction: None,
            badges: Vec::new(),
            is_admin: false,
            last_online: Timestamp::from_millis(0),
            unlocked_achievements: Vec::new(),
            level: 1,
            experience: 0,
            equipped_achievement: None,
            graph: FollowEdges::default(),
        }
    }

    /// Follow edges of this user
    pub fn graph(&self) -> &FollowEdges {
        &self.graph
    }

    // Edge sets are only writable from `crate::social`.
    pub(crate) fn graph_mut(&mut self) -> &mut FollowEdges {
        &mut self.graph
    }

    /// Whether `identifier` names this user by username or email, ignoring case
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.username.eq_ignore_ascii_case(identifier) || self.email.eq_ignore_ascii_case(identifier)
    }

    pub fn has_unlocked(&self, achievement: AchievementId) -> bool {
        self.unlocked_achievements.contains(&achievement)
    }

    /// Add experience and raise the level to match. Levels never go down.
    pub(crate) fn grant_experience(&mut self, amount: u64) {
        self.experience = self.experience.saturating_add(amount);
        let earned = (self.experience / EXPERIENCE_PER_LEVEL) as u32;
        self.level = self.level.max(earned);
    }
}

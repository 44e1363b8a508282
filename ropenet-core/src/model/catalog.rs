//! Process-wide catalogs: achievements and plugins.
//!
//! Neither belongs to an instance. Plugins are feature toggles for optional
//! widgets; nothing in the core reads them besides the plugin actions.

use super::types::AchievementId;
use serde::{Deserialize, Serialize};

/// An unlockable achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    /// Experience granted on unlock
    pub reward: u64,
    pub image_url: String,
}

/// Optional UI feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl Plugin {
    pub fn new(id: &str, name: &str, description: &str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            enabled,
        }
    }
}

//! Session-scoped state: who is signed in and what they are looking at.

use crate::model::{Faction, ThreadId, UserId};
use serde::{Deserialize, Serialize};

/// Top-level screen of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Forum,
    Profile,
    Shop,
    Factions,
    Leaderboard,
    Achievements,
    Messages,
    Admin,
    FactionPage,
}

/// What the active view is focused on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selection {
    User(UserId),
    Username(String),
    Thread(ThreadId),
    Faction(Faction),
}

/// Colour theme. Survives instance switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Dark,
    HighContrast,
    Cyberpunk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub current_user: Option<UserId>,
    pub active_view: View,
    pub selection: Option<Selection>,
    pub theme: Theme,
}

impl Session {
    /// Drop everything tied to the current instance; the theme stays
    pub fn reset(&mut self) {
        self.current_user = None;
        self.active_view = View::default();
        self.selection = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }
}

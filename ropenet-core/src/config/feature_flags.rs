//! Feature flag management for runtime configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Feature flags for enabling/disabling functionality at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Like/dislike toggle per user instead of always counting
    pub reaction_dedup: bool,

    /// Run the synthetic notification generator while signed in
    pub notification_generator: bool,

    /// Mark generated notifications read after a delay
    pub auto_read_notifications: bool,

    /// Custom feature flags (key-value pairs)
    pub custom: HashMap<String, bool>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            reaction_dedup: false,
            notification_generator: true,
            auto_read_notifications: true,
            custom: HashMap::new(),
        }
    }
}

/// Thread-safe feature flag manager
#[derive(Debug, Clone)]
pub struct FeatureManager {
    flags: Arc<RwLock<FeatureFlags>>,
}

impl FeatureManager {
    /// Create a new feature manager with default flags
    pub fn new() -> Self {
        Self::with_flags(FeatureFlags::default())
    }

    /// Create a new feature manager with custom flags
    pub fn with_flags(flags: FeatureFlags) -> Self {
        Self { flags: Arc::new(RwLock::new(flags)) }
    }

    // A panic while holding the lock cannot leave a flag half-written, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, FeatureFlags> {
        self.flags.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FeatureFlags> {
        self.flags.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if reactions are deduplicated per user
    pub fn is_reaction_dedup_enabled(&self) -> bool {
        self.read().reaction_dedup
    }

    /// Check if the notification generator may run
    pub fn is_notification_generator_enabled(&self) -> bool {
        self.read().notification_generator
    }

    /// Check if generated notifications are auto-read
    pub fn is_auto_read_enabled(&self) -> bool {
        self.read().auto_read_notifications
    }

    /// Check a custom feature flag
    pub fn is_enabled(&self, feature: &str) -> bool {
        self.read().custom.get(feature).copied().unwrap_or(false)
    }

    /// Enable a feature flag
    pub fn enable(&self, feature: &str) {
        self.set(feature, true);
    }

    /// Disable a feature flag
    pub fn disable(&self, feature: &str) {
        self.set(feature, false);
    }

    fn set(&self, feature: &str, value: bool) {
        let mut flags = self.write();
        match feature {
            "reaction_dedup" => flags.reaction_dedup = value,
            "notification_generator" => flags.notification_generator = value,
            "auto_read_notifications" => flags.auto_read_notifications = value,
            _ => {
                flags.custom.insert(feature.to_string(), value);
            }
        }
    }

    /// Get all current flags
    pub fn get_flags(&self) -> FeatureFlags {
        self.read().clone()
    }

    /// Update all flags
    pub fn update_flags(&self, new_flags: FeatureFlags) {
        *self.write() = new_flags;
    }
}

impl Default for FeatureManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = FeatureFlags::default();
        assert!(!flags.reaction_dedup);
        assert!(flags.notification_generator);
        assert!(flags.auto_read_notifications);

        let keys: Vec<String> =
            serde_json::to_value(&flags).unwrap().as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| k != "experimental"));
    }

    #[test]
    fn test_feature_manager() {
        let manager = FeatureManager::new();

        assert!(!manager.is_reaction_dedup_enabled());

        manager.enable("reaction_dedup");
        assert!(manager.is_reaction_dedup_enabled());

        manager.disable("reaction_dedup");
        assert!(!manager.is_reaction_dedup_enabled());
    }

    #[test]
    fn test_custom_flags() {
        let manager = FeatureManager::new();

        assert!(!manager.is_enabled("custom_feature"));

        manager.enable("custom_feature");
        assert!(manager.is_enabled("custom_feature"));

        manager.disable("custom_feature");
        assert!(!manager.is_enabled("custom_feature"));
    }

    #[test]
    fn test_clones_share_flags() {
        let manager = FeatureManager::new();
        let other = manager.clone();
        other.disable("notification_generator");
        assert!(!manager.is_notification_generator_enabled());
    }
}

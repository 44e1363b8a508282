//! Session and profile actions.

use super::errors::{Outcome, StoreError, StoreResult};
use super::events::Change;
use super::input::Registration;
use super::partition::CheckInRecord;
use super::session::{Selection, Theme, View};
use super::social_store::SocialStore;
use crate::model::{
    AchievementId, NewNotification, Notification, NotificationKind, User, UserId, UserStatus,
};
use crate::social::{self, FollowChange};
use tracing::info;

impl SocialStore {
    // ---- session ----

    /// Sign in by username or email within the active instance
    pub fn login(&mut self, identifier: &str) -> StoreResult<User> {
        self.run("login", |store| {
            let id = store
                .active_partition()
                .find_user(identifier.trim())
                .map(|u| u.id)
                .ok_or_else(|| StoreError::UnknownIdentifier(identifier.to_string()))?;

            let now = store.clock.now();
            let instance = store.active_instance_id();
            let user = store
                .active_partition_mut()
                .users
                .get_mut(&id)
                .ok_or(StoreError::UserNotFound(id))?;
            user.status = UserStatus::Online;
            user.last_online = now;
            let user = user.clone();

            store.session.current_user = Some(id);
            info!(user = %user.username, instance = %instance, "Signed in");
            store.commit(instance, Change::SignedIn { user_id: id });
            Ok(user)
        })
    }

    pub fn logout(&mut self) -> StoreResult<Outcome> {
        self.run("logout", |store| {
            let Some(id) = store.session.current_user else {
                return Ok(Outcome::Unchanged);
            };
            let now = store.clock.now();
            if let Some(user) = store.active_partition_mut().users.get_mut(&id) {
                user.status = UserStatus::Offline;
                user.last_online = now;
            }
            store.session.current_user = None;
            let instance = store.active_instance_id();
            info!(user = %id, "Signed out");
            store.commit(instance, Change::SignedOut { user_id: id });
            Ok(Outcome::Applied)
        })
    }

    /// Create a user in the active instance and sign them in.
    ///
    /// Username and email must be unique within the instance, ignoring case.
    pub fn register(&mut self, input: Registration) -> StoreResult<User> {
        self.run("register", |store| {
            input.validate()?;
            let partition = store.active_partition();
            if partition.find_user(&input.username).is_some() {
                return Err(StoreError::Validation(format!("username '{}' is taken", input.username)));
            }
            if partition.find_user(&input.email).is_some() {
                return Err(StoreError::Validation(format!("email '{}' is taken", input.email)));
            }

            let mut user = User::new(store.allocator.next(), input.username, input.email);
            user.phone = input.phone;
            user.avatar_url = input.avatar_url;
            user.bio = input.bio;
            user.faction = input.faction;
            user.status = UserStatus::Online;
            user.last_online = store.clock.now();

            let id = user.id;
            let instance = store.active_instance_id();
            store.active_partition_mut().insert_user(user.clone());
            store.session.current_user = Some(id);
            info!(user = %user.username, id = %id, "Registered user");
            store.commit(instance, Change::UserRegistered { user_id: id });
            Ok(user)
        })
    }

    pub fn set_view(&mut self, view: View, selection: Option<Selection>) -> StoreResult<Outcome> {
        self.run("set_view", |store| {
            if store.session.active_view == view && store.session.selection == selection {
                return Ok(Outcome::Unchanged);
            }
            store.session.active_view = view;
            store.session.selection = selection;
            let instance = store.active_instance_id();
            store.commit(instance, Change::SessionUpdated);
            Ok(Outcome::Applied)
        })
    }

    pub fn set_theme(&mut self, theme: Theme) -> StoreResult<Outcome> {
        self.run("set_theme", |store| {
            if store.session.theme == theme {
                return Ok(Outcome::Unchanged);
            }
            store.session.theme = theme;
            let instance = store.active_instance_id();
            store.commit(instance, Change::SessionUpdated);
            Ok(Outcome::Applied)
        })
    }

    // ---- social graph ----

    /// Follow `target` as the signed-in user, or unfollow if already following
    pub fn toggle_follow(&mut self, target: UserId) -> StoreResult<FollowChange> {
        self.run("toggle_follow", |store| {
            let me = store.require_user()?;
            let change = social::toggle_follow(&mut store.active_partition_mut().users, me, target)?;
            let instance = store.active_instance_id();
            store.commit(instance, Change::FollowToggled { follower: me, followee: target, direction: change });
            Ok(change)
        })
    }

    // ---- gamification ----

    /// Daily check-in for the signed-in user.
    ///
    /// At most once per calendar day of the store clock. Consecutive days
    /// extend the streak; a gap restarts it at 1.
    pub fn check_in(&mut self) -> StoreResult<Outcome> {
        self.run("check_in", |store| {
            let me = store.require_user()?;
            let today = store.clock.today();
            let previous = store.active_partition().check_in(me).copied();

            let streak = match previous {
                Some(record) if record.last_day >= today => return Ok(Outcome::Unchanged),
                Some(record) if record.last_day.succ_opt() == Some(today) => record.streak + 1,
                _ => 1,
            };
            let record = CheckInRecord {
                last_day: today,
                streak,
                total: previous.map(|r| r.total).unwrap_or(0) + 1,
            };

            let experience = store.config.check_in_experience;
            let reputation = store.config.check_in_reputation;
            let instance = store.active_instance_id();
            let partition = store.active_partition_mut();
            let user = partition.users.get_mut(&me).ok_or(StoreError::UserNotFound(me))?;
            user.grant_experience(experience);
            user.reputation = user.reputation.saturating_add(reputation);
            partition.check_ins.insert(me, record);

            store.commit(instance, Change::CheckedIn { user_id: me, day: today, streak });
            Ok(Outcome::Applied)
        })
    }

    pub fn set_status(&mut self, status: UserStatus) -> StoreResult<Outcome> {
        self.run("set_status", |store| {
            let me = store.require_user()?;
            let instance = store.active_instance_id();
            let user = store.active_partition_mut().users.get_mut(&me).ok_or(StoreError::UserNotFound(me))?;
            if user.status == status {
                return Ok(Outcome::Unchanged);
            }
            user.status = status;
            store.commit(instance, Change::ProfileUpdated { user_id: me });
            Ok(Outcome::Applied)
        })
    }

    /// Unlock an achievement for the signed-in user.
    ///
    /// Grants the achievement's reward as experience and posts an
    /// achievement notification. Unlocking twice changes nothing.
    pub fn unlock_achievement(&mut self, achievement: AchievementId) -> StoreResult<Outcome> {
        self.run("unlock_achievement", |store| {
            let me = store.require_user()?;
            let (name, reward) = store
                .achievements
                .iter()
                .find(|a| a.id == achievement)
                .map(|a| (a.name.clone(), a.reward))
                .ok_or(StoreError::AchievementNotFound(achievement))?;
            let unlocked = store
                .active_partition()
                .user(me)
                .ok_or(StoreError::UserNotFound(me))?
                .has_unlocked(achievement);
            if unlocked {
                return Ok(Outcome::Unchanged);
            }

            let notification = Notification::from_input(
                store.allocator.next(),
                NewNotification::new(NotificationKind::Achievement, format!("Achievement unlocked: {name}")),
                store.clock.now(),
            );
            let instance = store.active_instance_id();
            let partition = store.active_partition_mut();
            if let Some(user) = partition.users.get_mut(&me) {
                user.unlocked_achievements.push(achievement);
                user.grant_experience(reward);
            }
            partition.notifications.insert(0, notification);

            info!(user = %me, achievement = %name, "Achievement unlocked");
            store.commit(instance, Change::ProfileUpdated { user_id: me });
            Ok(Outcome::Applied)
        })
    }

    /// Show an unlocked achievement next to the signed-in user's name
    pub fn equip_achievement(&mut self, achievement: AchievementId) -> StoreResult<Outcome> {
        self.run("equip_achievement", |store| {
            let me = store.require_user()?;
            let name = store
                .achievements
                .iter()
                .find(|a| a.id == achievement)
                .map(|a| a.name.clone())
                .ok_or(StoreError::AchievementNotFound(achievement))?;

            let instance = store.active_instance_id();
            let user = store.active_partition_mut().users.get_mut(&me).ok_or(StoreError::UserNotFound(me))?;
            if !user.has_unlocked(achievement) {
                return Err(StoreError::Validation(format!("achievement '{name}' is not unlocked")));
            }
            if user.equipped_achievement.as_deref() == Some(name.as_str()) {
                return Ok(Outcome::Unchanged);
            }
            user.equipped_achievement = Some(name);
            store.commit(instance, Change::ProfileUpdated { user_id: me });
            Ok(Outcome::Applied)
        })
    }

    // ---- plugins ----

    /// Flip a plugin's enabled flag; returns the new value
    pub fn toggle_plugin(&mut self, plugin_id: &str) -> StoreResult<bool> {
        self.run("toggle_plugin", |store| {
            let plugin = store
                .plugins
                .iter_mut()
                .find(|p| p.id == plugin_id)
                .ok_or_else(|| StoreError::PluginNotFound(plugin_id.to_string()))?;
            plugin.enabled = !plugin.enabled;
            let enabled = plugin.enabled;
            let instance = store.active_instance_id();
            store.commit(instance, Change::PluginToggled { plugin_id: plugin_id.to_string(), enabled });
            Ok(enabled)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, InstanceId};
    use crate::social::check_symmetry;
    use crate::store::seed::ALLEY_INSTANCE;
    use crate::store::social_store::tests::test_store;
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_login_by_username_or_email() {
        let (mut store, _) = test_store();
        let user = store.login("NOMAD").unwrap();
        assert_eq!(user.id, EntityId(2));
        assert_eq!(user.status, UserStatus::Online);

        let user = store.login("cypher@ropenet.local").unwrap();
        assert_eq!(store.current_user().map(|u| u.id), Some(user.id));

        assert!(matches!(store.login("AlleyCat"), Err(StoreError::UnknownIdentifier(_))));
        assert_eq!(store.session().current_user, Some(EntityId(1)));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (mut store, _) = test_store();
        assert_eq!(store.logout().unwrap(), Outcome::Unchanged);
        store.login("nomad").unwrap();
        assert_eq!(store.logout().unwrap(), Outcome::Applied);
        assert_eq!(store.user(EntityId(2)).unwrap().status, UserStatus::Offline);
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_register_enforces_uniqueness() {
        let (mut store, _) = test_store();
        let user = store.register(Registration::new("Kit", "kit@ropenet.local")).unwrap();
        assert_eq!(user.id, EntityId(1000));
        assert_eq!(store.current_user().unwrap().username, "Kit");

        assert!(matches!(
            store.register(Registration::new("kit", "other@ropenet.local")),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.register(Registration::new("Other", "CYPHER@ropenet.local")),
            Err(StoreError::Validation(_))
        ));

        // Usernames are only unique per instance
        store.switch_instance(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
        assert!(store.register(Registration::new("Kit", "kit@alley.net")).is_ok());
    }

    #[test]
    fn test_follow_twice_restores_graph() {
        let (mut store, _) = test_store();
        store.login("nomad").unwrap();

        assert_eq!(store.toggle_follow(EntityId(1)).unwrap(), FollowChange::Followed);
        assert!(store.user(EntityId(2)).unwrap().graph().is_following(EntityId(1)));
        assert!(store.user(EntityId(1)).unwrap().graph().followers().contains(&EntityId(2)));

        assert_eq!(store.toggle_follow(EntityId(1)).unwrap(), FollowChange::Unfollowed);
        assert!(!store.user(EntityId(2)).unwrap().graph().is_following(EntityId(1)));
        assert!(!store.user(EntityId(1)).unwrap().graph().followers().contains(&EntityId(2)));
        assert_eq!(check_symmetry(&store.active_partition().users), None);
    }

    #[test]
    fn test_follow_rejections() {
        let (mut store, _) = test_store();
        assert_eq!(store.toggle_follow(EntityId(2)).unwrap_err(), StoreError::NotAuthenticated);

        store.login("cypher").unwrap();
        assert!(matches!(store.toggle_follow(EntityId(1)), Err(StoreError::Validation(_))));
        assert_eq!(store.toggle_follow(EntityId(101)).unwrap_err(), StoreError::UserNotFound(EntityId(101)));
        assert!(store.user(EntityId(1)).unwrap().graph().is_following(EntityId(2)));
    }

    #[test]
    fn test_check_in_once_per_day() {
        let (mut store, clock) = test_store();
        store.login("nomad").unwrap();

        assert_eq!(store.check_in().unwrap(), Outcome::Applied);
        assert_eq!(store.check_in().unwrap(), Outcome::Unchanged);
        let record = *store.check_in_record(EntityId(2)).unwrap();
        assert_eq!((record.streak, record.total), (1, 1));

        let user = store.user(EntityId(2)).unwrap();
        assert_eq!(user.experience, 8_100);
        assert_eq!(user.reputation, 860);

        clock.advance(DAY);
        assert_eq!(store.check_in().unwrap(), Outcome::Applied);
        assert_eq!(store.check_in_record(EntityId(2)).unwrap().streak, 2);

        clock.advance(DAY * 3);
        store.check_in().unwrap();
        let record = store.check_in_record(EntityId(2)).unwrap();
        assert_eq!((record.streak, record.total), (1, 3));
    }

    #[test]
    fn test_check_in_requires_login() {
        let (mut store, _) = test_store();
        assert_eq!(store.check_in().unwrap_err(), StoreError::NotAuthenticated);
    }

    #[test]
    fn test_achievements() {
        let (mut store, _) = test_store();
        store.login("nomad").unwrap();

        assert!(matches!(store.equip_achievement(EntityId(501)), Err(StoreError::Validation(_))));
        assert!(store.unlock_achievement(EntityId(999)).unwrap_err().is_not_found());

        assert_eq!(store.unlock_achievement(EntityId(501)).unwrap(), Outcome::Applied);
        assert_eq!(store.unlock_achievement(EntityId(501)).unwrap(), Outcome::Unchanged);
        assert_eq!(store.user(EntityId(2)).unwrap().experience, 8_100);
        assert_eq!(store.notifications()[0].kind, NotificationKind::Achievement);
        assert_eq!(store.notifications().len(), 1);

        assert_eq!(store.equip_achievement(EntityId(501)).unwrap(), Outcome::Applied);
        assert_eq!(
            store.user(EntityId(2)).unwrap().equipped_achievement.as_deref(),
            Some("First Post")
        );
    }

    #[test]
    fn test_toggle_plugin() {
        let (mut store, _) = test_store();
        assert!(!store.toggle_plugin("weather").unwrap());
        assert!(store.toggle_plugin("weather").unwrap());
        assert!(store.toggle_plugin("countdown").unwrap());
        assert_eq!(store.toggle_plugin("radio").unwrap_err(), StoreError::PluginNotFound("radio".into()));
    }

    #[test]
    fn test_view_and_theme() {
        let (mut store, _) = test_store();
        assert_eq!(store.set_view(View::Forum, None).unwrap(), Outcome::Unchanged);
        assert_eq!(
            store.set_view(View::Profile, Some(Selection::Username("Nomad".into()))).unwrap(),
            Outcome::Applied
        );
        store.set_theme(Theme::Cyberpunk).unwrap();

        store.switch_instance(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
        assert_eq!(store.session().active_view, View::Forum);
        assert_eq!(store.session().selection, None);
        assert_eq!(store.session().theme, Theme::Cyberpunk);
    }
}

/*
    social_store.rs - The authoritative social-state store

    One `SocialStore` owns every instance partition, the session, the global
    catalogs and the id allocator. Mutations take `&mut self` and either fail
    before touching anything or run to completion, bump the version and emit
    exactly one event.

    Actions are split by area:
    - content.rs: threads, replies, reactions, reposts, missions
    - profile.rs: session, registration, follows, check-ins, achievements, plugins
    - inbox.rs:   notifications and direct messages
*/

use super::allocator::IdAllocator;
use super::clock::{Clock, SystemClock};
use super::errors::{StoreError, StoreResult};
use super::events::{Change, EventBroadcaster, StoreEvent};
use super::partition::{CheckInRecord, Partition};
use super::registry::{InstanceInfo, InstanceRegistry};
use super::seed;
use super::session::Session;
use crate::config::{FeatureManager, StoreConfig};
use crate::metrics::{self, MUTATIONS_APPLIED, MUTATIONS_REJECTED};
use crate::model::{
    Achievement, EntityId, InstanceId, Message, Notification, Plugin, Thread, ThreadId, ThreadView, User,
    UserId,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Read-only copy of everything the presentation layer renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u64,
    pub instance: InstanceInfo,
    pub session: Session,
    pub users: Vec<User>,
    /// Newest first, reply trees expanded
    pub threads: Vec<ThreadView>,
    pub messages: Vec<Message>,
    pub notifications: Vec<Notification>,
    pub plugins: Vec<Plugin>,
    pub achievements: Vec<Achievement>,
}

/// In-memory social store: single writer, many readers
pub struct SocialStore {
    pub(super) registry: InstanceRegistry,
    pub(super) allocator: IdAllocator,
    pub(super) session: Session,
    pub(super) plugins: Vec<Plugin>,
    pub(super) achievements: Vec<Achievement>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) features: FeatureManager,
    pub(super) config: StoreConfig,
    events: EventBroadcaster,
    version: u64,
    closed: bool,
}

impl SocialStore {
    /// Store seeded with the built-in instances, on the system clock
    pub fn new(config: StoreConfig, features: FeatureManager) -> StoreResult<Self> {
        Self::with_clock(config, features, Arc::new(SystemClock))
    }

    /// Store seeded with the built-in instances, on the given clock
    pub fn with_clock(
        config: StoreConfig,
        features: FeatureManager,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        let active = InstanceId::new(config.default_instance.clone());
        let registry = InstanceRegistry::new(seed::default_instances(clock.now()), active)?;
        Self::from_parts(
            registry,
            seed::default_plugins(),
            seed::default_achievements(),
            config,
            features,
            clock,
        )
    }

    /// Store over caller-provided data
    pub fn from_parts(
        registry: InstanceRegistry,
        plugins: Vec<Plugin>,
        achievements: Vec<Achievement>,
        config: StoreConfig,
        features: FeatureManager,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        let mut seen: HashSet<EntityId> = registry.entity_ids().collect();
        for achievement in &achievements {
            if !seen.insert(achievement.id) {
                return Err(StoreError::InvariantViolation(format!(
                    "achievement id {} collides with another entity",
                    achievement.id
                )));
            }
        }

        let highest = registry
            .max_entity_id()
            .into_iter()
            .chain(achievements.iter().map(|a| a.id))
            .max();
        let allocator = IdAllocator::starting_after(highest, config.first_id);

        info!(
            active = %registry.active_id(),
            instances = registry.list().len(),
            first_id = %allocator.peek(),
            "Social store initialized"
        );

        Ok(Self {
            registry,
            allocator,
            session: Session::default(),
            plugins,
            achievements,
            clock,
            features,
            events: EventBroadcaster::new(config.event_capacity),
            config,
            version: 0,
            closed: false,
        })
    }

    // ---- mutation plumbing ----

    /// Run one action. Failures are logged and counted; state was not touched.
    pub(super) fn run<T>(
        &mut self,
        action: &'static str,
        f: impl FnOnce(&mut Self) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let result = if self.closed { Err(StoreError::Closed) } else { f(self) };
        if let Err(err) = &result {
            warn!(action, error = %err, "Mutation rejected");
            metrics::record_counter(MUTATIONS_REJECTED, 1);
        }
        result
    }

    /// Record an applied mutation and notify subscribers
    pub(super) fn commit(&mut self, instance: InstanceId, change: Change) {
        self.version += 1;
        metrics::record_counter(MUTATIONS_APPLIED, 1);
        debug!(version = self.version, instance = %instance, change = ?change, "Mutation applied");
        self.events.emit(StoreEvent { version: self.version, instance, change });
    }

    pub(super) fn active_instance_id(&self) -> InstanceId {
        self.registry.active_id().clone()
    }

    pub(super) fn partition_mut(&mut self, instance: &InstanceId) -> StoreResult<&mut Partition> {
        Ok(&mut self.registry.get_mut(instance)?.partition)
    }

    pub(super) fn active_partition_mut(&mut self) -> &mut Partition {
        &mut self.registry.active_mut().partition
    }

    /// The signed-in user, or `NotAuthenticated`
    pub(super) fn require_user(&self) -> StoreResult<UserId> {
        self.session.current_user.ok_or(StoreError::NotAuthenticated)
    }

    /// `author` must be a user of `instance`. A user of some other instance
    /// is a cross-instance reference, not just a bad id.
    pub(super) fn check_author(&self, instance: &InstanceId, author: UserId) -> StoreResult<()> {
        if self.partition(instance)?.contains_user(author) {
            return Ok(());
        }
        match self.registry.owner_of_user(author) {
            Some(owner) => Err(StoreError::InvariantViolation(format!(
                "user {author} belongs to instance {owner}, not {instance}"
            ))),
            None => Err(StoreError::Validation(format!("unknown author {author}"))),
        }
    }

    // ---- lifecycle ----

    /// Subscribe to change events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Close the store. Later mutations fail with `Closed`; reads keep working.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        let instance = self.active_instance_id();
        self.session.current_user = None;
        self.commit(instance, Change::TornDown);
        self.closed = true;
        info!(version = self.version, "Social store torn down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of applied mutations so far
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn features(&self) -> &FeatureManager {
        &self.features
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ---- instances ----

    /// Make `id` the active instance and clear the session.
    ///
    /// The theme survives. Each partition keeps its own state, so switching
    /// back shows what that instance last had.
    pub fn switch_instance(&mut self, id: &InstanceId) -> StoreResult<InstanceId> {
        self.run("switch_instance", |store| {
            let previous = store.registry.switch(id)?;
            store.session.reset();
            metrics::record_counter(metrics::INSTANCE_SWITCHES, 1);
            info!(from = %previous, to = %id, "Switched instance");
            store.commit(id.clone(), Change::InstanceSwitched { from: previous.clone(), to: id.clone() });
            Ok(previous)
        })
    }

    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.registry.list()
    }

    pub fn active_instance(&self) -> &InstanceInfo {
        &self.registry.active().info
    }

    pub fn partition(&self, instance: &InstanceId) -> StoreResult<&Partition> {
        Ok(&self.registry.get(instance)?.partition)
    }

    pub fn active_partition(&self) -> &Partition {
        &self.registry.active().partition
    }

    // ---- reads ----

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user.and_then(|id| self.active_partition().user(id))
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.active_partition().user(id)
    }

    pub fn users(&self) -> Vec<&User> {
        self.active_partition().users().collect()
    }

    /// Threads of the active instance, newest first
    pub fn threads(&self) -> Vec<&Thread> {
        self.active_partition().sorted_threads()
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.active_partition().thread(id)
    }

    pub fn thread_view(&self, id: ThreadId) -> Option<ThreadView> {
        self.active_partition().thread_view(id)
    }

    pub fn thread_views_in(&self, instance: &InstanceId) -> StoreResult<Vec<ThreadView>> {
        Ok(self.partition(instance)?.thread_views())
    }

    /// Look a user of `instance` up by username, ignoring case
    pub fn find_user_by_username(&self, instance: &InstanceId, username: &str) -> StoreResult<&User> {
        self.partition(instance)?
            .users()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .ok_or_else(|| StoreError::UnknownIdentifier(username.to_string()))
    }

    /// Notifications of the active instance, newest first
    pub fn notifications(&self) -> &[Notification] {
        self.active_partition().notifications()
    }

    pub fn unread_notifications(&self) -> Vec<&Notification> {
        self.notifications().iter().filter(|n| !n.is_read()).collect()
    }

    /// Conversation between the signed-in user and `other`, oldest first
    pub fn messages_with(&self, other: UserId) -> StoreResult<Vec<&Message>> {
        let me = self.require_user()?;
        let mut messages: Vec<&Message> =
            self.active_partition().messages().iter().filter(|m| m.is_between(me, other)).collect();
        messages.sort_by_key(|m| (m.timestamp, m.id));
        Ok(messages)
    }

    pub fn check_in_record(&self, user: UserId) -> Option<&CheckInRecord> {
        self.active_partition().check_in(user)
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn snapshot(&self) -> Snapshot {
        let partition = self.active_partition();
        Snapshot {
            version: self.version,
            instance: self.active_instance().clone(),
            session: self.session.clone(),
            users: partition.users().cloned().collect(),
            threads: partition.thread_views(),
            messages: partition.messages().to_vec(),
            notifications: partition.notifications().to_vec(),
            plugins: self.plugins.clone(),
            achievements: self.achievements.clone(),
        }
    }
}

impl std::fmt::Debug for SocialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialStore")
            .field("active", self.registry.active_id())
            .field("version", &self.version)
            .field("next_id", &self.allocator.peek())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::clock::ManualClock;
    use crate::store::seed::{ALLEY_INSTANCE, LOCAL_INSTANCE};
    use chrono::NaiveDate;

    pub(crate) fn test_store() -> (SocialStore, ManualClock) {
        let clock = ManualClock::at_noon(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        let store =
            SocialStore::with_clock(StoreConfig::default(), FeatureManager::new(), Arc::new(clock.clone()))
                .unwrap();
        (store, clock)
    }

    #[test]
    fn test_starts_on_default_instance() {
        let (store, _) = test_store();
        assert_eq!(store.active_instance().id, InstanceId::new(LOCAL_INSTANCE));
        assert_eq!(store.version(), 0);
        assert!(store.current_user().is_none());
        assert_eq!(store.instances().len(), 2);
    }

    #[test]
    fn test_allocator_starts_above_seed() {
        let (store, _) = test_store();
        assert_eq!(store.allocator.peek(), EntityId(1000));
    }

    #[test]
    fn test_unknown_default_instance_rejected() {
        let config = StoreConfig { default_instance: "nowhere".to_string(), ..StoreConfig::default() };
        let err = SocialStore::new(config, FeatureManager::new()).unwrap_err();
        assert_eq!(err, StoreError::InstanceNotFound(InstanceId::new("nowhere")));
    }

    #[test]
    fn test_switch_instance_isolates_reads() {
        let (mut store, _) = test_store();
        store.login("cypher").unwrap();

        let previous = store.switch_instance(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
        assert_eq!(previous, InstanceId::new(LOCAL_INSTANCE));
        assert!(store.current_user().is_none());

        let alley = store.partition(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
        for user in store.users() {
            assert!(alley.contains_user(user.id));
        }
        for thread in store.threads() {
            assert!(alley.thread(thread.id).is_some());
        }
        assert!(store.user(EntityId(1)).is_none());
        assert!(store.thread(EntityId(10)).is_none());
    }

    #[test]
    fn test_switch_to_unknown_instance_changes_nothing() {
        let (mut store, _) = test_store();
        store.login("cypher").unwrap();
        let version = store.version();

        let err = store.switch_instance(&InstanceId::new("nowhere")).unwrap_err();
        assert_eq!(err, StoreError::InstanceNotFound(InstanceId::new("nowhere")));
        assert_eq!(store.version(), version);
        assert_eq!(store.current_user().map(|u| u.id), Some(EntityId(1)));
    }

    #[test]
    fn test_teardown_closes_mutations() {
        let (mut store, _) = test_store();
        let mut rx = store.subscribe();
        store.teardown();
        store.teardown();

        assert!(store.is_closed());
        assert_eq!(rx.try_recv().unwrap().change, Change::TornDown);
        assert!(rx.try_recv().is_err());
        assert_eq!(store.login("cypher").unwrap_err(), StoreError::Closed);
        assert_eq!(store.threads().len(), 2);
    }

    #[test]
    fn test_snapshot_reflects_active_instance() {
        let (mut store, _) = test_store();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.threads[0].thread.id, EntityId(20));
        assert_eq!(snapshot.threads[1].reply_count(), 1);

        store.switch_instance(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.instance.id, InstanceId::new(ALLEY_INSTANCE));
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn test_author_from_other_instance_is_invariant_violation() {
        let (store, _) = test_store();
        let local = InstanceId::new(LOCAL_INSTANCE);
        assert!(store.check_author(&local, EntityId(1)).is_ok());
        assert!(matches!(
            store.check_author(&local, EntityId(101)),
            Err(StoreError::InvariantViolation(_))
        ));
        assert!(matches!(store.check_author(&local, EntityId(999)), Err(StoreError::Validation(_))));
    }
}

//! Async host for a [`SocialStore`]
//!
//! Wraps the single-writer store in one `tokio::sync::RwLock` so tasks can
//! share it; each mutation holds the write lock for its whole run. The
//! handle also owns the notification generator and ties it to the session:
//! it starts on login and stops on logout, instance switch and teardown.

use super::errors::{Outcome, StoreResult};
use super::events::StoreEvent;
use super::social_store::{SocialStore, Snapshot};
use crate::config::{Config, FeatureManager, GeneratorConfig};
use crate::generator::NotificationGenerator;
use crate::model::{InstanceId, User};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

/// Cloneable handle shared by the UI, the boundary server and the generator
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<RwLock<SocialStore>>,
    generator: Arc<Mutex<NotificationGenerator>>,
    generator_config: GeneratorConfig,
}

impl StoreHandle {
    pub fn new(store: SocialStore, generator_config: GeneratorConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            generator: Arc::new(Mutex::new(NotificationGenerator::new())),
            generator_config,
        }
    }

    /// Seeded store built from application config
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let features = FeatureManager::with_flags(config.features.clone());
        let store = SocialStore::new(config.store.clone(), features)?;
        Ok(Self::new(store, config.generator.clone()))
    }

    /// The shared store, for callers that lock it themselves
    pub fn shared(&self) -> Arc<RwLock<SocialStore>> {
        self.store.clone()
    }

    /// Run `f` under the read lock
    pub async fn read<R>(&self, f: impl FnOnce(&SocialStore) -> R) -> R {
        let store = self.store.read().await;
        f(&store)
    }

    /// Run `f` under the write lock.
    ///
    /// Login belongs on [`StoreHandle::login`], which starts the generator;
    /// `f` signing in never does. If `f` signs out, switches instance or
    /// tears the store down, the generator is stopped before returning.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut SocialStore) -> R) -> R {
        let mut generator = self.generator.lock().await;
        let mut store = self.store.write().await;
        let result = f(&mut store);
        let orphaned = generator.instance().is_some_and(|instance| {
            store.is_closed() || store.current_user().is_none() || store.active_instance().id != *instance
        });
        if orphaned {
            debug!("Session ended inside a mutation");
            generator.stop();
        }
        result
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.read(SocialStore::snapshot).await
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.read(SocialStore::subscribe).await
    }

    /// Sign in and start the generator for the active instance
    pub async fn login(&self, identifier: &str) -> StoreResult<User> {
        let mut generator = self.generator.lock().await;
        let (user, instance, enabled) = {
            let mut store = self.store.write().await;
            let user = store.login(identifier)?;
            let enabled = store.features().is_notification_generator_enabled();
            (user, store.active_instance().id.clone(), enabled)
        };
        if enabled {
            generator.start(self.store.clone(), instance, self.generator_config.clone());
        }
        Ok(user)
    }

    pub async fn logout(&self) -> StoreResult<Outcome> {
        let mut generator = self.generator.lock().await;
        generator.stop();
        self.store.write().await.logout()
    }

    /// Stop the generator, then switch. Returns the previously active instance.
    pub async fn switch_instance(&self, id: &InstanceId) -> StoreResult<InstanceId> {
        let mut generator = self.generator.lock().await;
        let mut store = self.store.write().await;
        // Validate first so a bad id leaves the generator running.
        store.partition(id)?;
        generator.stop();
        store.switch_instance(id)
    }

    pub async fn teardown(&self) {
        let mut generator = self.generator.lock().await;
        generator.stop();
        self.store.write().await.teardown();
    }

    pub async fn generator_running(&self) -> bool {
        self.generator.lock().await.is_running()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").field("generator_config", &self.generator_config).finish()
    }
}

//! Synthetic notification generator
//!
//! While a user is signed in, a background task adds one notification every
//! `interval`, picked uniformly from a small catalog. Each generated
//! notification is marked read after `auto_read_after` unless the user got
//! there first.
//!
//! The task goes through the same mutation API as every other caller and
//! only ever writes to the instance it was started on. Stopping the
//! generator aborts the loop and every pending auto-read timer with it.

use crate::config::GeneratorConfig;
use crate::metrics::{self, NOTIFICATIONS_EMITTED};
use crate::model::{InstanceId, NewNotification, NotificationId, NotificationKind};
use crate::store::SocialStore;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One entry of the notification catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub kind: NotificationKind,
    pub content: &'static str,
}

impl Template {
    pub fn to_input(&self) -> NewNotification {
        NewNotification::new(self.kind, self.content)
    }
}

pub const TEMPLATES: [Template; 3] = [
    Template { kind: NotificationKind::Reply, content: "Nomad replied to your post" },
    Template { kind: NotificationKind::Message, content: "New message from AlleyCat" },
    Template { kind: NotificationKind::Mission, content: "New mission posted: design a logo" },
];

/// Pick a template uniformly at random
pub fn pick_template<R: Rng + ?Sized>(rng: &mut R) -> &'static Template {
    &TEMPLATES[rng.random_range(0..TEMPLATES.len())]
}

/// Handle to the background task; at most one loop runs at a time
#[derive(Debug, Default)]
pub struct NotificationGenerator {
    task: Option<JoinHandle<()>>,
    instance: Option<InstanceId>,
}

impl NotificationGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start generating for `instance`, replacing any running loop
    pub fn start(&mut self, store: Arc<RwLock<SocialStore>>, instance: InstanceId, config: GeneratorConfig) {
        self.stop();
        info!(
            instance = %instance,
            interval = ?config.interval,
            "Notification generator started"
        );
        self.instance = Some(instance.clone());
        self.task = Some(tokio::spawn(run_loop(store, instance, config)));
    }

    /// Abort the loop and its pending timers. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        self.instance = None;
        match self.task.take() {
            Some(task) => {
                task.abort();
                info!("Notification generator stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Instance the loop was started for, until it is stopped
    pub fn instance(&self) -> Option<&InstanceId> {
        self.instance.as_ref()
    }
}

impl Drop for NotificationGenerator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_loop(store: Arc<RwLock<SocialStore>>, instance: InstanceId, config: GeneratorConfig) {
    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Dropped with this future, which aborts every pending auto-read.
    let mut timers = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let template = pick_template(&mut rand::rng());
                let mut guard = store.write().await;

                if guard.is_closed() {
                    break;
                }
                if guard.session().current_user.is_none() || guard.active_instance().id != instance {
                    debug!("No signed-in user on the generator's instance, skipping");
                    continue;
                }

                match guard.add_notification_in(&instance, template.to_input()) {
                    Ok(id) => {
                        metrics::record_counter(NOTIFICATIONS_EMITTED, 1);
                        debug!(id = %id, kind = ?template.kind, "Generated notification");
                        if guard.features().is_auto_read_enabled() {
                            timers.spawn(auto_read(
                                store.clone(),
                                instance.clone(),
                                id,
                                config.auto_read_after,
                            ));
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to add generated notification"),
                }
            }
            Some(_) = timers.join_next(), if !timers.is_empty() => {}
        }
    }
}

async fn auto_read(store: Arc<RwLock<SocialStore>>, instance: InstanceId, id: NotificationId, delay: Duration) {
    tokio::time::sleep(delay).await;
    let mut guard = store.write().await;
    if let Err(e) = guard.mark_notification_as_read_in(&instance, id) {
        debug!(id = %id, error = %e, "Auto-read skipped");
    }
}

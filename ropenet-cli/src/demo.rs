//! Scripted walk through the store actions

use anyhow::{Context, Result};
use ropenet_core::model::{InstanceId, NewNotification, NotificationKind};
use ropenet_core::store::{NewReply, NewThread, Snapshot, StoreHandle};
use tracing::info;

/// Sign in as the first user of the instance, post, reply twice, like,
/// follow, check in, then sign out. Returns the snapshot taken before
/// signing out.
pub async fn run(handle: &StoreHandle, instance: Option<&str>) -> Result<Snapshot> {
    if let Some(id) = instance {
        handle.switch_instance(&InstanceId::new(id)).await?;
    }

    let (username, other) = handle
        .read(|store| {
            let users = store.users();
            let first = users.first().map(|u| u.username.clone());
            (first, users.get(1).map(|u| u.id))
        })
        .await;
    let username = username.context("instance has no users")?;
    let me = handle.login(&username).await?;
    info!(user = %me.username, "Demo signed in");

    let snapshot = handle
        .mutate(|store| -> Result<Snapshot> {
            let thread = store.create_thread(
                NewThread::post(me.id, "Hello from the demo", "First post through the store API")
                    .with_tags(vec!["demo".to_string()]),
            )?;
            let reply = store.create_reply(thread.id, None, NewReply::new(me.id, "A reply"))?;
            store.create_reply(thread.id, Some(reply.id), NewReply::new(me.id, "A nested reply"))?;
            store.toggle_like(thread.id, None)?;
            if let Some(other) = other {
                store.toggle_follow(other)?;
            }
            store.check_in()?;
            store.add_notification(
                NewNotification::new(NotificationKind::System, "Demo finished").about_thread(thread.id),
            )?;
            Ok(store.snapshot())
        })
        .await?;

    handle.logout().await?;
    Ok(snapshot)
}

//! Concurrent access through the store handle

use futures::future::join_all;
use ropenet_core::config::Config;
use ropenet_core::model::{EntityId, InstanceId, NewNotification, NotificationKind};
use ropenet_core::store::seed::ALLEY_INSTANCE;
use ropenet_core::store::{Change, NewReply, StoreHandle};
use std::collections::HashSet;

#[tokio::test]
async fn concurrent_replies_get_distinct_ids() {
    let handle = StoreHandle::from_config(&Config::default()).unwrap();
    let tasks = (0..32).map(|i| {
        let handle = handle.clone();
        tokio::spawn(async move {
            handle
                .mutate(|store| store.create_reply(EntityId(10), None, NewReply::new(EntityId(2), format!("r{i}"))))
                .await
        })
    });

    let ids: Vec<EntityId> =
        join_all(tasks).await.into_iter().map(|joined| joined.unwrap().unwrap().id).collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 32);

    let view = handle.read(|store| store.thread_view(EntityId(10))).await.unwrap();
    // One seeded reply plus the new ones
    assert_eq!(view.replies.len(), 33);
}

#[tokio::test]
async fn subscribers_see_every_applied_change() {
    let handle = StoreHandle::from_config(&Config::default()).unwrap();
    let mut events = handle.subscribe().await;

    handle.login("cypher").await.unwrap();
    let id = handle
        .mutate(|store| store.add_notification(NewNotification::new(NotificationKind::System, "hello")))
        .await
        .unwrap();
    handle.mutate(|store| store.mark_notification_as_read(id)).await.unwrap();
    handle.mutate(|store| store.mark_notification_as_read(id)).await.unwrap();
    handle.switch_instance(&InstanceId::new(ALLEY_INSTANCE)).await.unwrap();
    handle.teardown().await;

    let mut changes = Vec::new();
    while let Ok(event) = events.try_recv() {
        changes.push(event.change);
    }
    assert!(matches!(changes[0], Change::SignedIn { user_id: EntityId(1) }));
    assert_eq!(changes[1], Change::NotificationAdded { notification_id: id });
    assert_eq!(changes[2], Change::NotificationRead { notification_id: id });
    // The repeated read changed nothing and emitted nothing
    assert!(matches!(changes[3], Change::InstanceSwitched { .. }));
    assert_eq!(changes.last(), Some(&Change::TornDown));
}

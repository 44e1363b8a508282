//! End-to-end scenarios against the social store

use chrono::NaiveDate;
use proptest::prelude::*;
use ropenet_core::config::{FeatureManager, StoreConfig};
use ropenet_core::model::{EntityId, InstanceId, NewNotification, NotificationKind, ParentRef, UserId};
use ropenet_core::social::FollowChange;
use ropenet_core::store::seed::{ALLEY_INSTANCE, LOCAL_INSTANCE};
use ropenet_core::store::{ManualClock, NewReply, NewThread, Outcome, SocialStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn store_with_clock() -> (SocialStore, ManualClock) {
    let clock = ManualClock::at_noon(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    let store =
        SocialStore::with_clock(StoreConfig::default(), FeatureManager::new(), Arc::new(clock.clone()))
            .unwrap();
    (store, clock)
}

fn store() -> SocialStore {
    store_with_clock().0
}

/// Every following edge has its follower edge and the other way round
fn assert_follow_symmetry(store: &SocialStore) {
    for user in store.users() {
        for followee in user.graph().following() {
            let other = store.user(*followee).unwrap();
            assert!(other.graph().followers().contains(&user.id));
        }
        for follower in user.graph().followers() {
            let other = store.user(*follower).unwrap();
            assert!(other.graph().following().contains(&user.id));
        }
    }
}

#[test]
fn thread_then_reply() {
    let mut store = store();
    let before: HashSet<EntityId> = store.threads().iter().map(|t| t.id).collect();

    let thread = store.create_thread(NewThread::post(EntityId(1), "", "hello")).unwrap();
    assert!(!before.contains(&thread.id));
    assert_eq!((thread.likes, thread.dislikes), (0, 0));
    assert!(store.thread_view(thread.id).unwrap().replies.is_empty());

    let reply = store.create_reply(thread.id, None, NewReply::new(EntityId(1), "hi")).unwrap();
    assert_eq!((reply.likes, reply.dislikes), (0, 0));
    assert_ne!(reply.id, thread.id);
    assert_eq!(store.thread(thread.id).unwrap().replies, vec![reply.id]);
    assert_eq!(store.threads()[0].id, thread.id);
}

#[test]
fn very_deep_reply_chain() {
    const DEPTH: usize = 100_000;
    let mut store = store();
    let thread = store.create_thread(NewThread::post(EntityId(1), "", "deep")).unwrap();
    let mut parent = None;
    let mut last = thread.id;
    for _ in 0..DEPTH {
        let reply = store.create_reply(thread.id, parent, NewReply::new(EntityId(1), "down")).unwrap();
        parent = Some(reply.id);
        last = reply.id;
    }
    assert_eq!(store.active_partition().depth(last).unwrap(), DEPTH);

    let view = store.thread_view(thread.id).unwrap();
    assert_eq!(view.reply_count(), DEPTH);
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["replies"].as_array().unwrap().len(), DEPTH);
    assert_eq!(json["replies"][DEPTH - 1]["id"], last.0);
    drop(view);

    let snapshot = store.snapshot();
    let deep = snapshot.threads.iter().find(|t| t.thread.id == thread.id).unwrap();
    assert_eq!(deep.reply_count(), DEPTH);
    assert!(serde_json::to_string(&snapshot).is_ok());
    drop(snapshot);
}

#[test]
fn follow_twice_restores_graph() {
    let mut store = store();
    store.login("cypher").unwrap();
    // Cypher starts out following Nomad
    assert_eq!(store.toggle_follow(EntityId(2)).unwrap(), FollowChange::Unfollowed);
    assert_eq!(store.toggle_follow(EntityId(2)).unwrap(), FollowChange::Followed);
    assert_eq!(store.toggle_follow(EntityId(2)).unwrap(), FollowChange::Unfollowed);

    assert!(!store.user(EntityId(1)).unwrap().graph().following().contains(&EntityId(2)));
    assert!(!store.user(EntityId(2)).unwrap().graph().followers().contains(&EntityId(1)));
    assert_follow_symmetry(&store);
}

#[test]
fn follow_requires_sign_in_and_a_local_target() {
    let mut store = store();
    assert_eq!(store.toggle_follow(EntityId(2)).unwrap_err(), StoreError::NotAuthenticated);

    store.login("nomad").unwrap();
    let version = store.version();
    assert!(store.toggle_follow(EntityId(101)).unwrap_err().is_not_found());
    assert!(store.toggle_follow(EntityId(2)).is_err());
    assert_eq!(store.version(), version);
}

#[test]
fn notification_read_once() {
    let mut store = store();
    let id = store.add_notification(NewNotification::new(NotificationKind::Mission, "new mission")).unwrap();
    assert!(!store.notifications()[0].is_read());
    assert_eq!(store.mark_notification_as_read(id).unwrap(), Outcome::Applied);
    assert_eq!(store.mark_notification_as_read(id).unwrap(), Outcome::Unchanged);
    assert!(store.notifications()[0].is_read());
}

#[test]
fn check_in_once_per_day() {
    let (mut store, clock) = store_with_clock();
    store.login("nomad").unwrap();
    let experience = store.current_user().unwrap().experience;

    assert_eq!(store.check_in().unwrap(), Outcome::Applied);
    clock.advance(Duration::from_secs(3600));
    assert_eq!(store.check_in().unwrap(), Outcome::Unchanged);
    assert_eq!(store.current_user().unwrap().experience, experience + 100);

    clock.advance(Duration::from_secs(24 * 3600));
    assert_eq!(store.check_in().unwrap(), Outcome::Applied);
    let record = store.check_in_record(EntityId(2)).unwrap();
    assert_eq!((record.streak, record.total), (2, 2));
}

#[test]
fn switch_isolates_instances() {
    let mut store = store();
    store.login("cypher").unwrap();
    store.create_thread(NewThread::post(EntityId(1), "local", "only here")).unwrap();

    let previous = store.switch_instance(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
    assert_eq!(previous, InstanceId::new(LOCAL_INSTANCE));
    assert!(store.current_user().is_none());

    let alley = store.partition(&InstanceId::new(ALLEY_INSTANCE)).unwrap();
    assert!(store.users().iter().all(|u| alley.contains_user(u.id)));
    assert!(store.threads().iter().all(|t| alley.thread(t.id).is_some()));
    assert!(store.threads().iter().all(|t| t.title != "local"));

    // The local partition kept the new thread
    let local = store.thread_views_in(&InstanceId::new(LOCAL_INSTANCE)).unwrap();
    assert_eq!(local[0].thread.title, "local");
}

#[test]
fn cross_instance_author_is_rejected() {
    let mut store = store();
    let err = store.create_thread(NewThread::post(EntityId(101), "t", "c")).unwrap_err();
    assert!(matches!(err, StoreError::InvariantViolation(_)));

    let err = store.create_reply(EntityId(201), None, NewReply::new(EntityId(1), "x")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn ids_are_unique_across_kinds() {
    let mut store = store();
    store.login("cypher").unwrap();
    let mut ids = Vec::new();
    for i in 0..5 {
        let thread = store.create_thread(NewThread::post(EntityId(1), "t", format!("post {i}"))).unwrap();
        ids.push(thread.id);
        ids.push(store.create_reply(thread.id, None, NewReply::new(EntityId(2), "r")).unwrap().id);
        ids.push(store.add_notification(NewNotification::new(NotificationKind::Reply, "n")).unwrap());
        ids.push(store.send_message(EntityId(2), "m").unwrap());
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

fn chain_store(depth: usize) -> (SocialStore, Vec<EntityId>) {
    let mut store = store();
    let mut chain = Vec::new();
    let mut parent = None;
    for i in 0..depth {
        let reply = store
            .create_reply(EntityId(10), parent, NewReply::new(EntityId(2), format!("level {i}")))
            .unwrap();
        chain.push(reply.id);
        parent = Some(reply.id);
    }
    (store, chain)
}

proptest! {
    #[test]
    fn follow_parity_decides_membership(toggles in 0usize..12) {
        let mut store = store();
        store.login("nomad").unwrap();
        for _ in 0..toggles {
            store.toggle_follow(EntityId(1)).unwrap();
        }
        let following = store.user(EntityId(2)).unwrap().graph().is_following(EntityId(1));
        prop_assert_eq!(following, toggles % 2 == 1);
        assert_follow_symmetry(&store);
    }

    #[test]
    fn nested_reply_depth(depth in 1usize..24) {
        let (store, chain) = chain_store(depth);
        let partition = store.active_partition();
        for (i, id) in chain.iter().enumerate() {
            prop_assert_eq!(partition.depth(*id).unwrap(), i + 1);
        }
        let last = *chain.last().unwrap();
        let ancestors = partition.ancestors(last).unwrap();
        prop_assert_eq!(ancestors.last().copied(), Some(ParentRef::Thread(EntityId(10))));
        prop_assert!(!ancestors.contains(&ParentRef::Reply(last)));
    }
}

#[test]
fn user_ids_resolve_within_instance() {
    let store = store();
    let owner: UserId = store
        .find_user_by_username(&InstanceId::new(ALLEY_INSTANCE), "alleycat")
        .unwrap()
        .id;
    assert_eq!(owner, EntityId(101));
    assert!(store.user(owner).is_none());
}

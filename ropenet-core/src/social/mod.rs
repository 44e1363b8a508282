//! Social graph: the follow relation between users of one instance.
//!
//! `following` and `followers` are two views of one relation. The edge sets
//! live inside each [`User`] but only this module can write them, so the
//! symmetric-complement invariant (B ∈ A.following ⇔ A ∈ B.followers) has a
//! single owner. Everything else reads through [`FollowEdges`].

use crate::model::{User, UserId};
use crate::store::errors::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Follow edges carried by a single user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdges {
    following: BTreeSet<UserId>,
    followers: BTreeSet<UserId>,
}

impl FollowEdges {
    /// Users this user follows
    pub fn following(&self) -> &BTreeSet<UserId> {
        &self.following
    }

    /// Users following this user
    pub fn followers(&self) -> &BTreeSet<UserId> {
        &self.followers
    }

    pub fn is_following(&self, user_id: UserId) -> bool {
        self.following.contains(&user_id)
    }
}

/// Direction a follow toggle went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowChange {
    Followed,
    Unfollowed,
}

impl FollowChange {
    pub fn is_following(&self) -> bool {
        matches!(self, FollowChange::Followed)
    }
}

/// Flip `actor`'s follow of `target`, updating both edge sets together.
///
/// Both users are looked up before either is touched, so a failed toggle
/// leaves the table unchanged.
pub(crate) fn toggle_follow(
    users: &mut BTreeMap<UserId, User>,
    actor: UserId,
    target: UserId,
) -> StoreResult<FollowChange> {
    if actor == target {
        return Err(StoreError::Validation("a user cannot follow themselves".to_string()));
    }

    let currently_following = users
        .get(&actor)
        .ok_or(StoreError::UserNotFound(actor))?
        .graph()
        .is_following(target);

    if !users.contains_key(&target) {
        return Err(StoreError::UserNotFound(target));
    }

    let change = if currently_following {
        set_edge(users, actor, target, false);
        FollowChange::Unfollowed
    } else {
        set_edge(users, actor, target, true);
        FollowChange::Followed
    };

    debug_assert!(check_symmetry(users).is_none(), "follow graph lost symmetry");
    Ok(change)
}

/// Record a follow edge while building seed data.
pub(crate) fn seed_follow(users: &mut BTreeMap<UserId, User>, follower: UserId, followee: UserId) {
    if follower != followee && users.contains_key(&follower) && users.contains_key(&followee) {
        set_edge(users, follower, followee, true);
    }
}

// Callers guarantee both users exist.
fn set_edge(users: &mut BTreeMap<UserId, User>, follower: UserId, followee: UserId, present: bool) {
    if let Some(user) = users.get_mut(&follower) {
        let edges = user.graph_mut();
        if present {
            edges.following.insert(followee);
        } else {
            edges.following.remove(&followee);
        }
    }
    if let Some(user) = users.get_mut(&followee) {
        let edges = user.graph_mut();
        if present {
            edges.followers.insert(follower);
        } else {
            edges.followers.remove(&follower);
        }
    }
}

/// Audit the whole table and return the first edge without its mirror.
///
/// The returned pair is `(follower, followee)`. Edges pointing at users that
/// are not in the table count as violations.
pub fn check_symmetry(users: &BTreeMap<UserId, User>) -> Option<(UserId, UserId)> {
    for (id, user) in users {
        for followee in user.graph().following() {
            let mirrored = users
                .get(followee)
                .map(|other| other.graph().followers().contains(id))
                .unwrap_or(false);
            if !mirrored {
                return Some((*id, *followee));
            }
        }
        for follower in user.graph().followers() {
            let mirrored = users
                .get(follower)
                .map(|other| other.graph().following().contains(id))
                .unwrap_or(false);
            if !mirrored {
                return Some((*follower, *id));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityId;

    fn table(ids: &[u64]) -> BTreeMap<UserId, User> {
        ids.iter()
            .map(|raw| {
                let id = EntityId(*raw);
                (id, User::new(id, format!("user{raw}"), format!("user{raw}@example.net")))
            })
            .collect()
    }

    #[test]
    fn test_follow_then_unfollow() {
        let mut users = table(&[1, 2]);

        let change = toggle_follow(&mut users, EntityId(1), EntityId(2)).unwrap();
        assert_eq!(change, FollowChange::Followed);
        assert!(users[&EntityId(1)].graph().is_following(EntityId(2)));
        assert!(users[&EntityId(2)].graph().followers().contains(&EntityId(1)));

        let change = toggle_follow(&mut users, EntityId(1), EntityId(2)).unwrap();
        assert_eq!(change, FollowChange::Unfollowed);
        assert!(users[&EntityId(1)].graph().following().is_empty());
        assert!(users[&EntityId(2)].graph().followers().is_empty());
    }

    #[test]
    fn test_follow_is_directional() {
        let mut users = table(&[1, 2]);
        toggle_follow(&mut users, EntityId(1), EntityId(2)).unwrap();

        assert!(!users[&EntityId(2)].graph().is_following(EntityId(1)));
        assert!(users[&EntityId(1)].graph().followers().is_empty());
    }

    #[test]
    fn test_missing_target_leaves_table_unchanged() {
        let mut users = table(&[1]);
        let before = users.clone();

        let err = toggle_follow(&mut users, EntityId(1), EntityId(9)).unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(EntityId(9))));
        assert_eq!(users, before);
    }

    #[test]
    fn test_self_follow_rejected() {
        let mut users = table(&[1]);
        let err = toggle_follow(&mut users, EntityId(1), EntityId(1)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_check_symmetry_detects_dangling_edge() {
        let mut users = table(&[1, 2]);
        seed_follow(&mut users, EntityId(1), EntityId(2));
        assert!(check_symmetry(&users).is_none());

        users.remove(&EntityId(2));
        assert_eq!(check_symmetry(&users), Some((EntityId(1), EntityId(2))));
    }
}

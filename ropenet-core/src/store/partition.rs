/*
    partition.rs - Contents of one instance

    Holds the users, threads, replies, messages and notifications of a single
    tenant. Replies live in a flat table keyed by id; every node records its
    parent container and its children, and nested views are rebuilt by lookup.
    Nothing in a partition refers to an entity of another partition.
*/

use crate::model::{
    EntityId, Message, Notification, ParentRef, Reply, ReplyId, ReplyView, Thread, ThreadId,
    ThreadView, User, UserId,
};
use crate::store::errors::{StoreError, StoreResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Daily check-in bookkeeping for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub last_day: NaiveDate,
    /// Consecutive days ending at `last_day`
    pub streak: u32,
    pub total: u32,
}

/// Who reacted to one thread or reply. Only consulted when reaction dedup is on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ReactionLedger {
    pub(crate) likes: BTreeSet<UserId>,
    pub(crate) dislikes: BTreeSet<UserId>,
}

/// The mutable contents of one instance
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub(crate) users: BTreeMap<UserId, User>,
    /// Newest first by insertion; readers sort by timestamp anyway
    pub(crate) threads: Vec<Thread>,
    pub(crate) replies: HashMap<ReplyId, Reply>,
    pub(crate) messages: Vec<Message>,
    pub(crate) notifications: Vec<Notification>,
    pub(crate) check_ins: HashMap<UserId, CheckInRecord>,
    pub(crate) reactions: HashMap<EntityId, ReactionLedger>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn contains_user(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Look a user up by username or email, ignoring case
    pub fn find_user(&self, identifier: &str) -> Option<&User> {
        self.users.values().find(|u| u.matches_identifier(identifier))
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id)
    }

    pub(crate) fn thread_mut(&mut self, id: ThreadId) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id == id)
    }

    pub fn reply(&self, id: ReplyId) -> Option<&Reply> {
        self.replies.get(&id)
    }

    /// Find `reply` in the tree rooted at `thread`
    pub fn reply_in_thread(&self, thread: ThreadId, reply: ReplyId) -> Option<&Reply> {
        self.replies.get(&reply).filter(|r| r.thread_id == thread)
    }

    pub(crate) fn reply_in_thread_mut(&mut self, thread: ThreadId, reply: ReplyId) -> Option<&mut Reply> {
        self.replies.get_mut(&reply).filter(|r| r.thread_id == thread)
    }

    pub fn check_in(&self, user: UserId) -> Option<&CheckInRecord> {
        self.check_ins.get(&user)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Notifications, newest first
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub(crate) fn notification_mut(&mut self, id: EntityId) -> Option<&mut Notification> {
        self.notifications.iter_mut().find(|n| n.id == id)
    }

    /// Threads sorted newest first; equal timestamps put the higher id first
    pub fn sorted_threads(&self) -> Vec<&Thread> {
        let mut threads: Vec<&Thread> = self.threads.iter().collect();
        threads.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        threads
    }

    /// Containers from `reply`'s parent up to its thread, nearest first.
    ///
    /// Fails if the chain is broken or loops back on itself.
    pub fn ancestors(&self, reply: ReplyId) -> StoreResult<Vec<ParentRef>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([reply]);
        let mut current = self
            .replies
            .get(&reply)
            .ok_or_else(|| StoreError::InvariantViolation(format!("reply {reply} is not in the table")))?;

        loop {
            let parent = current.parent;
            chain.push(parent);
            match parent {
                ParentRef::Thread(thread) => {
                    if thread != current.thread_id || self.thread(thread).is_none() {
                        return Err(StoreError::InvariantViolation(format!(
                            "reply {} hangs from missing thread {thread}",
                            current.id
                        )));
                    }
                    return Ok(chain);
                }
                ParentRef::Reply(parent_id) => {
                    if !seen.insert(parent_id) {
                        return Err(StoreError::InvariantViolation(format!(
                            "reply {reply} has a cycle in its ancestor chain"
                        )));
                    }
                    current = self.replies.get(&parent_id).ok_or_else(|| {
                        StoreError::InvariantViolation(format!(
                            "reply {} hangs from missing reply {parent_id}",
                            current.id
                        ))
                    })?;
                }
            }
        }
    }

    /// Depth of a reply: 1 for a direct reply to its thread
    pub fn depth(&self, reply: ReplyId) -> StoreResult<usize> {
        self.ancestors(reply).map(|chain| chain.len())
    }

    /// Insert a reply whose parent has already been checked.
    ///
    /// The reply must carry a fresh id; its parent gains it as the last child.
    pub(crate) fn attach_reply(&mut self, reply: Reply) -> StoreResult<()> {
        if self.replies.contains_key(&reply.id) {
            return Err(StoreError::InvariantViolation(format!("reply id {} already in use", reply.id)));
        }
        match reply.parent {
            ParentRef::Thread(thread_id) => {
                let thread = self
                    .thread_mut(thread_id)
                    .ok_or(StoreError::ThreadNotFound(thread_id))?;
                thread.replies.push(reply.id);
            }
            ParentRef::Reply(parent_id) => {
                let parent = self
                    .reply_in_thread_mut(reply.thread_id, parent_id)
                    .ok_or(StoreError::ReplyNotFound { thread: reply.thread_id, reply: parent_id })?;
                parent.replies.push(reply.id);
            }
        }
        self.replies.insert(reply.id, reply);
        Ok(())
    }

    /// Expand a thread and its whole reply tree
    pub fn thread_view(&self, id: ThreadId) -> Option<ThreadView> {
        let thread = self.thread(id)?;
        Some(ThreadView { thread: thread.clone(), replies: self.build_reply_views(&thread.replies) })
    }

    /// Every thread expanded, newest first
    pub fn thread_views(&self) -> Vec<ThreadView> {
        self.sorted_threads()
            .into_iter()
            .map(|t| ThreadView { thread: t.clone(), replies: self.build_reply_views(&t.replies) })
            .collect()
    }

    // Post-order walk with an explicit stack so deep trees do not recurse.
    fn build_reply_views(&self, roots: &[ReplyId]) -> Vec<ReplyView> {
        enum Frame {
            Enter(ReplyId),
            Exit(ReplyId),
        }

        let mut stack: Vec<Frame> = roots.iter().rev().map(|id| Frame::Enter(*id)).collect();
        let mut built: HashMap<ReplyId, ReplyView> = HashMap::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if let Some(reply) = self.replies.get(&id) {
                        stack.push(Frame::Exit(id));
                        stack.extend(reply.replies.iter().rev().map(|child| Frame::Enter(*child)));
                    }
                }
                Frame::Exit(id) => {
                    if let Some(reply) = self.replies.get(&id) {
                        let children =
                            reply.replies.iter().filter_map(|child| built.remove(child)).collect();
                        built.insert(id, ReplyView { reply: reply.clone(), replies: children });
                    }
                }
            }
        }

        roots.iter().filter_map(|id| built.remove(id)).collect()
    }

    /// Highest id used by anything in this partition
    pub fn max_entity_id(&self) -> Option<EntityId> {
        let users = self.users.keys().copied();
        let threads = self.threads.iter().flat_map(|t| {
            let subtasks = t
                .mission_details
                .iter()
                .flat_map(|m| m.subtasks.iter().map(|s| s.id))
                .collect::<Vec<_>>();
            std::iter::once(t.id).chain(subtasks)
        });
        let replies = self.replies.keys().copied();
        let messages = self.messages.iter().map(|m| m.id);
        let notifications = self.notifications.iter().map(|n| n.id);
        users.chain(threads).chain(replies).chain(messages).chain(notifications).max()
    }

    /// Every id used by anything in this partition
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.users.keys().copied().collect();
        for thread in &self.threads {
            ids.push(thread.id);
            if let Some(mission) = &thread.mission_details {
                ids.extend(mission.subtasks.iter().map(|s| s.id));
            }
        }
        ids.extend(self.replies.keys().copied());
        ids.extend(self.messages.iter().map(|m| m.id));
        ids.extend(self.notifications.iter().map(|n| n.id));
        ids
    }

    pub(crate) fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub(crate) fn push_thread_front(&mut self, thread: Thread) {
        self.threads.insert(0, thread);
    }
}

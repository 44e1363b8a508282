//! Content actions: threads, replies, reactions, reposts and missions.
//!
//! Every action has an active-instance form and an `_in` form addressed by
//! instance id. The boundary API uses the `_in` forms so it never touches
//! the interactive session.

use super::errors::{Outcome, StoreError, StoreResult};
use super::events::Change;
use super::input::{NewReply, NewThread};
use super::partition::Partition;
use super::social_store::SocialStore;
use crate::model::{
    EntityId, InstanceId, MissionDetails, ParentRef, Reply, ReplyId, Thread, ThreadId, UserId,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reaction {
    Like,
    Dislike,
}

/// Like and dislike counters of a thread or one of its replies
fn counters_mut(
    partition: &mut Partition,
    thread: ThreadId,
    reply: Option<ReplyId>,
) -> Option<(&mut u64, &mut u64)> {
    match reply {
        Some(reply) => partition.reply_in_thread_mut(thread, reply).map(|r| (&mut r.likes, &mut r.dislikes)),
        None => partition.thread_mut(thread).map(|t| (&mut t.likes, &mut t.dislikes)),
    }
}

fn check_target(partition: &Partition, thread: ThreadId, reply: Option<ReplyId>) -> StoreResult<()> {
    if partition.thread(thread).is_none() {
        return Err(StoreError::ThreadNotFound(thread));
    }
    if let Some(reply) = reply {
        partition
            .reply_in_thread(thread, reply)
            .ok_or(StoreError::ReplyNotFound { thread, reply })?;
    }
    Ok(())
}

fn mission_of(partition: &Partition, thread: ThreadId) -> StoreResult<&MissionDetails> {
    partition
        .thread(thread)
        .ok_or(StoreError::ThreadNotFound(thread))?
        .mission_details
        .as_ref()
        .ok_or_else(|| StoreError::Validation(format!("thread {thread} is not a mission")))
}

fn mission_of_mut(partition: &mut Partition, thread: ThreadId) -> StoreResult<&mut Thread> {
    let thread_ref = partition.thread_mut(thread).ok_or(StoreError::ThreadNotFound(thread))?;
    if thread_ref.mission_details.is_none() {
        return Err(StoreError::Validation(format!("thread {thread} is not a mission")));
    }
    Ok(thread_ref)
}

impl SocialStore {
    // ---- threads ----

    /// Create a thread in the active instance
    pub fn create_thread(&mut self, input: NewThread) -> StoreResult<Thread> {
        let instance = self.active_instance_id();
        self.create_thread_in(&instance, input)
    }

    pub fn create_thread_in(&mut self, instance: &InstanceId, input: NewThread) -> StoreResult<Thread> {
        self.run("create_thread", |store| {
            input.validate()?;
            store.check_author(instance, input.author_id)?;

            let id = store.allocator.next();
            let mission_details = input.mission_details.map(|mut details| {
                for subtask in &mut details.subtasks {
                    subtask.id = store.allocator.next();
                }
                details
            });
            let thread = Thread {
                id,
                title: input.title,
                content: input.content,
                tags: input.tags,
                author_id: input.author_id,
                timestamp: store.clock.now(),
                likes: 0,
                dislikes: 0,
                replies: Vec::new(),
                kind: input.kind,
                is_completed: false,
                mission_details,
                reposts: 0,
                quotes: 0,
            };

            store.partition_mut(instance)?.push_thread_front(thread.clone());
            store.commit(instance.clone(), Change::ThreadCreated { thread_id: id });
            Ok(thread)
        })
    }

    // ---- replies ----

    /// Reply to a thread, or to one of its replies when `parent` is set
    pub fn create_reply(
        &mut self,
        thread: ThreadId,
        parent: Option<ReplyId>,
        input: NewReply,
    ) -> StoreResult<Reply> {
        let instance = self.active_instance_id();
        self.create_reply_in(&instance, thread, parent, input)
    }

    pub fn create_reply_in(
        &mut self,
        instance: &InstanceId,
        thread: ThreadId,
        parent: Option<ReplyId>,
        input: NewReply,
    ) -> StoreResult<Reply> {
        self.run("create_reply", |store| {
            input.validate()?;
            check_target(store.partition(instance)?, thread, parent)?;
            store.check_author(instance, input.author_id)?;

            let parent = parent.map_or(ParentRef::Thread(thread), ParentRef::Reply);
            let reply = Reply {
                id: store.allocator.next(),
                thread_id: thread,
                parent,
                content: input.content,
                author_id: input.author_id,
                timestamp: store.clock.now(),
                likes: 0,
                dislikes: 0,
                replies: Vec::new(),
            };

            store.partition_mut(instance)?.attach_reply(reply.clone())?;
            store.commit(
                instance.clone(),
                Change::ReplyCreated { thread_id: thread, reply_id: reply.id, parent },
            );
            Ok(reply)
        })
    }

    // ---- reactions ----

    /// Like a thread, or a reply when `reply` is set.
    ///
    /// Counts once per call unless `reaction_dedup` is enabled, in which case
    /// it toggles the signed-in user's like.
    pub fn toggle_like(&mut self, thread: ThreadId, reply: Option<ReplyId>) -> StoreResult<Outcome> {
        self.react_as_session("toggle_like", thread, reply, Reaction::Like)
    }

    pub fn toggle_dislike(&mut self, thread: ThreadId, reply: Option<ReplyId>) -> StoreResult<Outcome> {
        self.react_as_session("toggle_dislike", thread, reply, Reaction::Dislike)
    }

    /// Anonymous like addressed by instance; always counts
    pub fn toggle_like_in(
        &mut self,
        instance: &InstanceId,
        thread: ThreadId,
        reply: Option<ReplyId>,
    ) -> StoreResult<Outcome> {
        self.run("toggle_like", |store| store.react(instance, thread, reply, Reaction::Like, None))
    }

    pub fn toggle_dislike_in(
        &mut self,
        instance: &InstanceId,
        thread: ThreadId,
        reply: Option<ReplyId>,
    ) -> StoreResult<Outcome> {
        self.run("toggle_dislike", |store| store.react(instance, thread, reply, Reaction::Dislike, None))
    }

    fn react_as_session(
        &mut self,
        action: &'static str,
        thread: ThreadId,
        reply: Option<ReplyId>,
        reaction: Reaction,
    ) -> StoreResult<Outcome> {
        self.run(action, |store| {
            let actor = if store.features.is_reaction_dedup_enabled() {
                Some(store.require_user()?)
            } else {
                None
            };
            let instance = store.active_instance_id();
            store.react(&instance, thread, reply, reaction, actor)
        })
    }

    fn react(
        &mut self,
        instance: &InstanceId,
        thread: ThreadId,
        reply: Option<ReplyId>,
        reaction: Reaction,
        actor: Option<UserId>,
    ) -> StoreResult<Outcome> {
        let partition = self.partition_mut(instance)?;
        check_target(partition, thread, reply)?;
        let target: EntityId = reply.unwrap_or(thread);

        // (like delta, dislike delta)
        let (like_delta, dislike_delta): (i8, i8) = match actor {
            None => match reaction {
                Reaction::Like => (1, 0),
                Reaction::Dislike => (0, 1),
            },
            Some(user) => {
                let ledger = partition.reactions.entry(target).or_default();
                let (mine, other) = match reaction {
                    Reaction::Like => (&mut ledger.likes, &mut ledger.dislikes),
                    Reaction::Dislike => (&mut ledger.dislikes, &mut ledger.likes),
                };
                let (mine_delta, other_delta) = if mine.remove(&user) {
                    (-1, 0)
                } else {
                    mine.insert(user);
                    (1, if other.remove(&user) { -1 } else { 0 })
                };
                match reaction {
                    Reaction::Like => (mine_delta, other_delta),
                    Reaction::Dislike => (other_delta, mine_delta),
                }
            }
        };

        let (likes, dislikes) = match counters_mut(partition, thread, reply) {
            Some((likes, dislikes)) => {
                *likes = apply_delta(*likes, like_delta);
                *dislikes = apply_delta(*dislikes, dislike_delta);
                (*likes, *dislikes)
            }
            None => return Err(StoreError::ThreadNotFound(thread)),
        };

        self.commit(instance.clone(), Change::ReactionChanged { thread_id: thread, target, likes, dislikes });
        Ok(Outcome::Applied)
    }

    // ---- reposts ----

    /// Bump a thread's repost counter; no new content is created
    pub fn repost_thread(&mut self, thread: ThreadId) -> StoreResult<u64> {
        let instance = self.active_instance_id();
        self.run("repost_thread", |store| {
            let thread_ref = store
                .partition_mut(&instance)?
                .thread_mut(thread)
                .ok_or(StoreError::ThreadNotFound(thread))?;
            thread_ref.reposts += 1;
            let reposts = thread_ref.reposts;
            store.commit(instance.clone(), Change::Reposted { thread_id: thread, reposts });
            Ok(reposts)
        })
    }

    // ---- missions ----

    /// Tick or untick a mission subtask
    pub fn update_mission_subtask(
        &mut self,
        thread: ThreadId,
        subtask: EntityId,
        completed: bool,
    ) -> StoreResult<Outcome> {
        self.run("update_mission_subtask", |store| {
            store.require_user()?;
            let instance = store.active_instance_id();
            let current = mission_of(store.active_partition(), thread)?
                .subtasks
                .iter()
                .find(|s| s.id == subtask)
                .map(|s| s.completed)
                .ok_or(StoreError::SubtaskNotFound { thread, subtask })?;
            if current == completed {
                return Ok(Outcome::Unchanged);
            }

            let mission = mission_of_mut(store.active_partition_mut(), thread)?;
            if let Some(details) = mission.mission_details.as_mut() {
                for entry in details.subtasks.iter_mut().filter(|s| s.id == subtask) {
                    entry.completed = completed;
                }
            }
            store.commit(instance, Change::MissionUpdated { thread_id: thread });
            Ok(Outcome::Applied)
        })
    }

    /// Submit a solution as the signed-in user, who becomes the assignee
    pub fn submit_mission_solution(&mut self, thread: ThreadId, solution: &str) -> StoreResult<Outcome> {
        self.run("submit_mission_solution", |store| {
            let me = store.require_user()?;
            if solution.trim().is_empty() {
                return Err(StoreError::Validation("solution must not be empty".to_string()));
            }
            let details = mission_of(store.active_partition(), thread)?;
            if details.is_approved {
                return Err(StoreError::Validation(format!("mission {thread} is already approved")));
            }
            if let Some(assignee) = details.assignee_id.filter(|a| *a != me) {
                return Err(StoreError::PermissionDenied(format!(
                    "mission {thread} is assigned to user {assignee}"
                )));
            }

            let instance = store.active_instance_id();
            let mission = mission_of_mut(store.active_partition_mut(), thread)?;
            if let Some(details) = mission.mission_details.as_mut() {
                details.assignee_id = Some(me);
                details.submitted_solution = Some(solution.to_string());
            }
            store.commit(instance, Change::MissionUpdated { thread_id: thread });
            Ok(Outcome::Applied)
        })
    }

    /// Approve a submitted mission (admins only).
    ///
    /// Marks the thread completed and credits the reward to the assignee's
    /// reputation.
    pub fn approve_mission(&mut self, thread: ThreadId) -> StoreResult<Outcome> {
        self.run("approve_mission", |store| {
            let me = store.require_user()?;
            let partition = store.active_partition();
            let is_admin = partition.user(me).map(|u| u.is_admin).unwrap_or(false);
            if !is_admin {
                return Err(StoreError::PermissionDenied("only admins can approve missions".to_string()));
            }

            let details = mission_of(partition, thread)?;
            if details.is_approved {
                return Ok(Outcome::Unchanged);
            }
            let assignee = match (details.assignee_id, &details.submitted_solution) {
                (Some(assignee), Some(_)) => assignee,
                _ => {
                    return Err(StoreError::Validation(format!(
                        "mission {thread} has no submitted solution"
                    )))
                }
            };
            if !partition.contains_user(assignee) {
                return Err(StoreError::InvariantViolation(format!(
                    "mission {thread} is assigned to missing user {assignee}"
                )));
            }
            let reward = i64::try_from(details.reward).unwrap_or(i64::MAX);

            let instance = store.active_instance_id();
            let partition = store.active_partition_mut();
            let mission = mission_of_mut(partition, thread)?;
            mission.is_completed = true;
            if let Some(details) = mission.mission_details.as_mut() {
                details.is_approved = true;
            }
            if let Some(user) = partition.users.get_mut(&assignee) {
                user.reputation = user.reputation.saturating_add(reward);
            }

            info!(thread = %thread, assignee = %assignee, reward, "Mission approved");
            store.commit(instance, Change::MissionUpdated { thread_id: thread });
            Ok(Outcome::Applied)
        })
    }
}

fn apply_delta(value: u64, delta: i8) -> u64 {
    match delta {
        d if d > 0 => value.saturating_add(d as u64),
        d if d < 0 => value.saturating_sub(d.unsigned_abs() as u64),
        _ => value,
    }
}

//! Threads, replies and the nested views derived from them.
//!
//! Replies are stored flat (see `store::partition`): each [`Reply`] records
//! its container and the ids of its children. [`ThreadView`] and
//! [`ReplyView`] are the nested shapes handed to readers.

use super::types::{EntityId, ReplyId, ThreadId, Timestamp, UserId};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Kind of thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadKind {
    #[default]
    Post,
    Mission,
}

/// Checklist entry of a mission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: EntityId,
    pub description: String,
    pub completed: bool,
}

/// Extra data carried by mission threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDetails {
    pub reward: u64,
    pub deadline: Timestamp,
    pub assignee_id: Option<UserId>,
    pub submitted_solution: Option<String>,
    pub is_approved: bool,
    pub subtasks: Vec<Subtask>,
}

/// A top-level post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub author_id: UserId,
    pub timestamp: Timestamp,
    pub likes: u64,
    pub dislikes: u64,
    /// Direct replies, in insertion order
    #[serde(skip)]
    pub replies: Vec<ReplyId>,
    #[serde(rename = "type")]
    pub kind: ThreadKind,
    pub is_completed: bool,
    pub mission_details: Option<MissionDetails>,
    pub reposts: u64,
    pub quotes: u64,
}

/// Container a reply hangs from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ParentRef {
    Thread(ThreadId),
    Reply(ReplyId),
}

/// A comment on a thread or on another reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: ReplyId,
    /// Thread at the root of this reply's tree
    pub thread_id: ThreadId,
    /// Container this reply was attached to
    pub parent: ParentRef,
    pub content: String,
    pub author_id: UserId,
    pub timestamp: Timestamp,
    pub likes: u64,
    pub dislikes: u64,
    /// Direct children, in insertion order
    #[serde(skip)]
    pub replies: Vec<ReplyId>,
}

/// Nested reply tree node.
///
/// Trees have no depth limit, so dropping, cloning, comparing and counting
/// walk an explicit stack instead of recursing.
pub struct ReplyView {
    pub reply: Reply,
    pub replies: Vec<ReplyView>,
}

impl ReplyView {
    /// Number of replies in this subtree, including this one
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(&node.replies);
        }
        total
    }
}

impl Drop for ReplyView {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.replies);
        }
    }
}

impl Clone for ReplyView {
    fn clone(&self) -> Self {
        Self { reply: self.reply.clone(), replies: clone_forest(&self.replies) }
    }
}

impl PartialEq for ReplyView {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.reply != b.reply || a.replies.len() != b.replies.len() {
                return false;
            }
            stack.extend(a.replies.iter().zip(&b.replies));
        }
        true
    }
}

impl fmt::Debug for ReplyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyView")
            .field("reply", &self.reply)
            .field("replies", &self.replies.len())
            .finish()
    }
}

/// Pre-order walk of a forest, roots at depth 0
fn preorder(forest: &[ReplyView]) -> Vec<(&ReplyView, usize)> {
    let mut out = Vec::new();
    let mut stack: Vec<(&ReplyView, usize)> = forest.iter().rev().map(|v| (v, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        out.push((node, depth));
        stack.extend(node.replies.iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

/// Rebuild a forest from pre-order rows
fn nest(rows: impl IntoIterator<Item = (Reply, usize)>) -> Vec<ReplyView> {
    fn close(open: &mut Vec<ReplyView>, roots: &mut Vec<ReplyView>) {
        if let Some(done) = open.pop() {
            match open.last_mut() {
                Some(parent) => parent.replies.push(done),
                None => roots.push(done),
            }
        }
    }

    let mut roots = Vec::new();
    let mut open: Vec<ReplyView> = Vec::new();
    for (reply, depth) in rows {
        while open.len() > depth {
            close(&mut open, &mut roots);
        }
        open.push(ReplyView { reply, replies: Vec::new() });
    }
    while !open.is_empty() {
        close(&mut open, &mut roots);
    }
    roots
}

fn clone_forest(forest: &[ReplyView]) -> Vec<ReplyView> {
    nest(preorder(forest).into_iter().map(|(node, depth)| (node.reply.clone(), depth)))
}

/// Thread with its reply tree expanded.
///
/// Serializes the tree flat: `replies` lists every reply in depth-first
/// order with its `depth` below the thread (1 for a direct reply) and the
/// ids of its children, so output does not nest however deep the thread is.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub thread: Thread,
    pub replies: Vec<ReplyView>,
}

impl ThreadView {
    /// Total replies at every depth
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(ReplyView::count).sum()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRow<'a> {
    #[serde(flatten)]
    reply: &'a Reply,
    depth: usize,
    replies: Vec<ReplyId>,
}

impl Serialize for ThreadView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(flatten)]
            thread: &'a Thread,
            replies: Vec<ReplyRow<'a>>,
        }

        let replies = preorder(&self.replies)
            .into_iter()
            .map(|(node, depth)| ReplyRow {
                reply: &node.reply,
                depth: depth + 1,
                replies: node.replies.iter().map(|child| child.reply.id).collect(),
            })
            .collect();
        Wire { thread: &self.thread, replies }.serialize(serializer)
    }
}

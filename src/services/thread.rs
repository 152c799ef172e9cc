//! In-memory assembly of comment threads.
//!
//! Descendants of a page of roots are fetched in one store call and grouped
//! here by parent id, instead of querying once per level per branch.

use std::collections::HashMap;

use crate::models::comment::{CommentRecord, ReplyNode, ThreadComment};

/// Maximum depth of a comment, counting the root as 1. Also the number of
/// reply levels assembled below a root.
pub const MAX_DEPTH: u32 = 5;

/// Builds the nested threads for `roots`. `descendants` may arrive in any
/// order; replies are ordered oldest first at every level.
pub fn assemble(roots: Vec<CommentRecord>, descendants: Vec<CommentRecord>) -> Vec<ThreadComment> {
    let mut children: HashMap<i64, Vec<CommentRecord>> = HashMap::new();
    for reply in descendants {
        if let Some(parent_id) = reply.parent_id {
            children.entry(parent_id).or_default().push(reply);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    }

    roots
        .into_iter()
        .map(|root| {
            let replies = replies_of(root.id, 0, &mut children);
            ThreadComment {
                reply_count: count_replies(&replies),
                comment: root.into(),
                replies,
            }
        })
        .collect()
}

fn replies_of(
    parent_id: i64,
    depth: u32,
    children: &mut HashMap<i64, Vec<CommentRecord>>,
) -> Vec<ReplyNode> {
    if depth >= MAX_DEPTH {
        return Vec::new();
    }
    let Some(siblings) = children.remove(&parent_id) else {
        return Vec::new();
    };

    siblings
        .into_iter()
        .map(|reply| {
            let replies = replies_of(reply.id, depth + 1, children);
            ReplyNode {
                comment: reply.into(),
                replies,
                depth: depth + 1,
            }
        })
        .collect()
}

/// Total number of nodes in a reply forest.
pub fn count_replies(replies: &[ReplyNode]) -> usize {
    replies
        .iter()
        .map(|reply| 1 + count_replies(&reply.replies))
        .sum()
}

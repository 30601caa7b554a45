//!
//! # Comment Threads
//!
//! Rebuilds the reply hierarchy of a post's comments from the flat list the
//! database returns.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Comment;

/// Assembles a flat, ordered list of comments into a forest of root comments.
///
/// - Comments without a parent become roots, in input order.
/// - Every other comment is attached to its parent's `replies`, in input
///   order, at whatever depth the parent sits.
/// - A comment whose parent is not in `flat` is dropped together with its
///   own replies. The same goes for self-referencing or cyclic chains, which
///   can never be reached from a root.
///
/// The assembly is iterative, so reply depth is bounded by memory rather
/// than by the call stack. The same holds for dropping the result and for
/// encoding it with [`write_json`].
pub fn build_tree(flat: Vec<Comment>) -> Vec<Comment> {
    let mut slots: Vec<Option<Comment>> = Vec::with_capacity(flat.len());
    let mut position_of: HashMap<i32, usize> = HashMap::with_capacity(flat.len());
    let mut roots = Vec::new();

    for (pos, mut comment) in flat.into_iter().enumerate() {
        comment.replies.clear();
        position_of.entry(comment.id).or_insert(pos);
        if comment.parent_id.is_none() {
            roots.push(pos);
        }
        slots.push(Some(comment));
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    for (pos, slot) in slots.iter().enumerate() {
        let Some(parent_id) = slot.as_ref().and_then(|c| c.parent_id) else {
            continue;
        };
        match position_of.get(&parent_id) {
            Some(&parent_pos) if parent_pos != pos => children[parent_pos].push(pos),
            _ => {}
        }
    }

    let mut visited = vec![false; slots.len()];
    let mut built: Vec<Option<Comment>> = (0..slots.len()).map(|_| None).collect();
    let mut forest = Vec::with_capacity(roots.len());

    for root in roots {
        // Post-order walk: a node is finished once all of its children are.
        let mut stack = vec![(root, 0usize)];
        visited[root] = true;

        while let Some((pos, next_child)) = stack.pop() {
            if let Some(&child) = children[pos].get(next_child) {
                stack.push((pos, next_child + 1));
                if !visited[child] {
                    visited[child] = true;
                    stack.push((child, 0));
                }
                continue;
            }

            if let Some(mut comment) = slots[pos].take() {
                comment.replies = children[pos]
                    .iter()
                    .filter_map(|&child| built[child].take())
                    .collect();
                built[pos] = Some(comment);
            }
        }

        if let Some(tree) = built[root].take() {
            forest.push(tree);
        }
    }

    forest
}

/// Every field of a [`Comment`] except `replies`.
#[derive(Serialize)]
struct CommentFields<'a> {
    id: i32,
    content: &'a str,
    post_id: i32,
    parent_id: Option<i32>,
    created_at: &'a DateTime<Utc>,
    user_id: Option<i32>,
    username: Option<&'a str>,
    avatar: Option<&'a str>,
}

impl<'a> From<&'a Comment> for CommentFields<'a> {
    fn from(comment: &'a Comment) -> Self {
        Self {
            id: comment.id,
            content: &comment.content,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            created_at: &comment.created_at,
            user_id: comment.user_id,
            username: comment.username.as_deref(),
            avatar: comment.avatar.as_deref(),
        }
    }
}

/// Encodes a forest as a JSON array of comments with nested `replies`, the
/// same document `serde_json` produces for `Vec<Comment>`, using an explicit
/// stack instead of one call frame per reply level.
pub fn write_json(forest: &[Comment]) -> serde_json::Result<Vec<u8>> {
    let mut out = vec![b'['];
    // (siblings, index of the next one to write)
    let mut stack: Vec<(&[Comment], usize)> = vec![(forest, 0)];

    while let Some((siblings, index)) = stack.pop() {
        let Some(comment) = siblings.get(index) else {
            out.push(b']');
            if !stack.is_empty() {
                // closes the comment that owns this `replies` array
                out.push(b'}');
            }
            continue;
        };

        if index > 0 {
            out.push(b',');
        }
        stack.push((siblings, index + 1));

        serde_json::to_writer(&mut out, &CommentFields::from(comment))?;
        out.pop();
        out.extend_from_slice(b",\"replies\":[");
        stack.push((comment.replies.as_slice(), 0));
    }

    Ok(out)
}

use std::collections::HashMap;

use crate::models::{Comment, CommentId};

#[derive(Debug, Clone)]
pub struct ThreadNode {
    pub comment: Comment,
    pub children: Vec<ThreadNode>,
}

/// Nests a flat, ordered list of comments. Sibling order is preserved; comments whose parent
/// is not in the list are dropped. Nesting stops at [`Comment::MAX_DEPTH`]: anything deeper is
/// listed, in thread order, under its ancestor at that depth.
pub fn build_thread(comments: Vec<Comment>) -> Vec<ThreadNode> {
    let mut by_parent: HashMap<Option<CommentId>, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_parent
            .entry(comment.parent_id.clone())
            .or_default()
            .push(comment);
    }
    attach(None, 0, &mut by_parent)
}

fn attach(
    parent: Option<CommentId>,
    depth: u32,
    by_parent: &mut HashMap<Option<CommentId>, Vec<Comment>>,
) -> Vec<ThreadNode> {
    let Some(siblings) = by_parent.remove(&parent) else {
        return Vec::new();
    };
    siblings
        .into_iter()
        .map(|comment| {
            let id = Some(comment.id.clone());
            let children = if depth < Comment::MAX_DEPTH {
                attach(id, depth + 1, by_parent)
            } else {
                flatten(id, by_parent)
            };
            ThreadNode { comment, children }
        })
        .collect()
}

/// All descendants of `parent` as leaves, depth first, without recursion.
fn flatten(
    parent: Option<CommentId>,
    by_parent: &mut HashMap<Option<CommentId>, Vec<Comment>>,
) -> Vec<ThreadNode> {
    let mut leaves = Vec::new();
    let mut stack: Vec<Comment> = by_parent.remove(&parent).unwrap_or_default();
    stack.reverse();
    while let Some(comment) = stack.pop() {
        if let Some(mut replies) = by_parent.remove(&Some(comment.id.clone())) {
            replies.reverse();
            stack.extend(replies);
        }
        leaves.push(ThreadNode {
            comment,
            children: Vec::new(),
        });
    }
    leaves
}

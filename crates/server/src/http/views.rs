use chrono::NaiveDateTime;
use domain::{gravatar_for, Avatar, Comment, CommentId, CommentsConfig, Post, ThreadNode};
use serde::Serialize;

pub const REMOVED_PLACEHOLDER: &str = "This comment has been removed.";

/// Public rendering of a comment. The email address never leaves the server.
#[derive(Serialize)]
pub struct CommentView {
    pub id: CommentId,
    pub parent_id: Option<CommentId>,
    pub name: String,
    pub url: String,
    pub comment: String,
    pub is_public: bool,
    pub is_removed: bool,
    pub created_at: NaiveDateTime,
    pub avatar: Avatar,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommentView>,
}

impl CommentView {
    pub fn new(comment: &Comment, size: Option<u32>, secure: bool, config: &CommentsConfig) -> Self {
        let info = comment.userinfo();
        Self {
            id: comment.id.clone(),
            parent_id: comment.parent_id.clone(),
            name: info.name.clone(),
            url: info.url.clone(),
            comment: if comment.is_removed {
                REMOVED_PLACEHOLDER.to_string()
            } else {
                comment.comment.clone()
            },
            is_public: comment.is_public,
            is_removed: comment.is_removed,
            created_at: comment.created_at,
            avatar: gravatar_for(comment, size, Some(secure), config),
            children: Vec::new(),
        }
    }

    pub fn thread(nodes: &[ThreadNode], size: Option<u32>, secure: bool, config: &CommentsConfig) -> Vec<Self> {
        nodes
            .iter()
            .map(|node| {
                let mut view = Self::new(&node.comment, size, secure, config);
                view.children = Self::thread(&node.children, size, secure, config);
                view
            })
            .collect()
    }
}

#[derive(Serialize)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub can_comment: bool,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            slug: post.slug,
            title: post.title,
            can_comment: post.can_comment,
        }
    }
}

#[derive(Serialize)]
pub struct ThreadView {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

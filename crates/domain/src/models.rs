use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};
use crate::identity::UserInfo;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(s: impl Into<String>) -> std::result::Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Site ID cannot be empty.".to_string());
        }
        if s.contains('_') {
            return Err("Site ID cannot contain underscores ('_'). Please use hyphens ('-') or dots ('.') instead.".to_string());
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err("Site ID contains invalid characters.".to_string());
        }
        if s.len() > 64 {
            return Err("Site ID is too long (max 64 chars).".to_string());
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account of the host authentication system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// The content object a comment thread hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub site_id: SiteId,
    pub slug: String,
    pub title: String,
    pub can_comment: bool,
}

impl Post {
    pub fn toggle_can_comment(&mut self) {
        self.can_comment = !self.can_comment;
    }
}

/// Who is posting a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    Account(Account),
    Anonymous { name: String, email: String },
}

/// A comment about some post.
///
/// `user_name`/`user_email`/`user_url` hold what an anonymous poster typed in. When `user` is set
/// the display identity comes from the account instead, see [`Comment::userinfo`].
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub site_id: SiteId,
    pub post_slug: String,
    pub parent_id: Option<CommentId>,
    /// 0 for roots.
    pub depth: u32,
    pub user: Option<Account>,
    pub user_name: String,
    pub user_email: String,
    pub user_url: String,
    pub comment: String,
    pub notify_by_email: bool,
    pub ip_address: Option<IpAddr>,
    pub is_public: bool,
    pub is_removed: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub(crate) userinfo: OnceCell<UserInfo>,
}

impl Comment {
    /// Deepest nesting level a reply may sit at.
    pub const MAX_DEPTH: u32 = 16;

    /// A public, not removed, anonymous root comment with blank fields.
    pub fn new(
        id: CommentId,
        site_id: SiteId,
        post_slug: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            site_id,
            post_slug: post_slug.into(),
            parent_id: None,
            depth: 0,
            user: None,
            user_name: String::new(),
            user_email: String::new(),
            user_url: String::new(),
            comment: String::new(),
            notify_by_email: true,
            ip_address: None,
            is_public: true,
            is_removed: false,
            created_at,
            last_modified_at: created_at,
            userinfo: OnceCell::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn toggle_removed(&mut self) {
        self.is_removed = !self.is_removed;
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let excerpt: String = self.comment.chars().take(50).collect();
        write!(f, "{}: {}...", self.name(), excerpt)
    }
}

/// Input for creating a comment, root or reply.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub post_slug: String,
    pub parent_id: Option<CommentId>,
    pub author: Author,
    pub url: String,
    pub body: String,
    pub notify_by_email: bool,
    pub ip_address: Option<IpAddr>,
}

impl CommentDraft {
    pub fn new(post_slug: impl Into<String>, author: Author, body: impl Into<String>) -> Self {
        Self {
            post_slug: post_slug.into(),
            parent_id: None,
            author,
            url: String::new(),
            body: body.into(),
            notify_by_email: true,
            ip_address: None,
        }
    }

    pub fn reply_to(mut self, parent_id: CommentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Length is counted in characters, not bytes.
    pub fn validate(&self, max_length: usize) -> Result<()> {
        let length = self.body.chars().count();
        if length > max_length {
            return Err(Error::invalid(
                "message",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max_length, length
                ),
            ));
        }
        Ok(())
    }

    pub fn into_comment(self, id: CommentId, site_id: SiteId, now: NaiveDateTime) -> Comment {
        let mut comment = Comment::new(id, site_id, self.post_slug, now);
        comment.parent_id = self.parent_id;
        comment.comment = self.body;
        comment.notify_by_email = self.notify_by_email;
        comment.ip_address = self.ip_address;
        comment.user_url = self.url;
        match self.author {
            Author::Account(account) => comment.user = Some(account),
            Author::Anonymous { name, email } => {
                comment.user_name = name;
                comment.user_email = email;
            }
        }
        comment
    }
}

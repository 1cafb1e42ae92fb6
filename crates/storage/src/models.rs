use chrono::NaiveDateTime;
use domain::{Account, Comment, CommentId, Post, SiteId};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub site_id: String,
    pub post_slug: String,
    pub parent_id: Option<String>,
    pub depth: u32,
    pub user_id: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub user_url: String,
    pub comment: String,
    pub notify_by_email: bool,
    pub ip_address: Option<String>,
    pub is_public: bool,
    pub is_removed: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,

    // joined from accounts
    pub account_username: Option<String>,
    pub account_email: Option<String>,
    pub account_full_name: Option<String>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        let mut comment = Comment::new(
            CommentId::new(sql.id),
            SiteId::new_unchecked(sql.site_id),
            sql.post_slug,
            sql.created_at,
        );
        comment.parent_id = sql.parent_id.map(CommentId::new);
        comment.depth = sql.depth;
        comment.user = match (sql.user_id, sql.account_username) {
            (Some(id), Some(username)) => Some(Account {
                id,
                username,
                email: sql.account_email.unwrap_or_default(),
                full_name: sql.account_full_name.unwrap_or_default(),
            }),
            _ => None,
        };
        comment.user_name = sql.user_name;
        comment.user_email = sql.user_email;
        comment.user_url = sql.user_url;
        comment.comment = sql.comment;
        comment.notify_by_email = sql.notify_by_email;
        comment.ip_address = sql.ip_address.and_then(|ip| ip.parse().ok());
        comment.is_public = sql.is_public;
        comment.is_removed = sql.is_removed;
        comment.last_modified_at = sql.last_modified_at;
        comment
    }
}

#[derive(FromRow)]
pub struct SqlPost {
    pub site_id: String,
    pub slug: String,
    pub title: String,
    pub can_comment: bool,
}

impl From<SqlPost> for Post {
    fn from(sql: SqlPost) -> Self {
        Post {
            site_id: SiteId::new_unchecked(sql.site_id),
            slug: sql.slug,
            title: sql.title,
            can_comment: sql.can_comment,
        }
    }
}

#[derive(FromRow)]
pub struct SqlAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

impl From<SqlAccount> for Account {
    fn from(sql: SqlAccount) -> Self {
        Account {
            id: sql.id,
            username: sql.username,
            email: sql.email,
            full_name: sql.full_name,
        }
    }
}

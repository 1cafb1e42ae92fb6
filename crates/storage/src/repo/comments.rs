use crate::{models::SqlComment, Db};
use anyhow::Context;
use chrono::Utc;
use domain::{Comment, CommentDraft, CommentFilter, CommentId, Error, SiteId};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

impl Db {
    pub(crate) async fn create_comment_table(&self) -> anyhow::Result<()> {
        let table = &self.comments;
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY NOT NULL,
                    site_id TEXT NOT NULL REFERENCES sites(id),
                    post_slug TEXT NOT NULL,
                    parent_id TEXT REFERENCES {table}(id),
                    depth INTEGER NOT NULL DEFAULT 0,
                    user_id TEXT REFERENCES accounts(id),
                    user_name TEXT NOT NULL DEFAULT '',
                    user_email TEXT NOT NULL DEFAULT '',
                    user_url TEXT NOT NULL DEFAULT '',
                    comment TEXT NOT NULL,
                    notify_by_email BOOLEAN NOT NULL DEFAULT TRUE,
                    ip_address TEXT,
                    is_public BOOLEAN NOT NULL DEFAULT TRUE,
                    is_removed BOOLEAN NOT NULL DEFAULT FALSE,
                    created_at DATETIME NOT NULL,
                    last_modified_at DATETIME NOT NULL,
                    FOREIGN KEY (site_id, post_slug) REFERENCES posts(site_id, slug)
                )
                "#
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {table}_post_idx ON {table} (site_id, post_slug, created_at)"
            ),
            format!("CREATE INDEX IF NOT EXISTS {table}_parent_idx ON {table} (parent_id)"),
        ];
        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn select_comments<'a>(&self) -> QueryBuilder<'a, Sqlite> {
        QueryBuilder::new(format!(
            r#"
            SELECT
                c.id, c.site_id, c.post_slug, c.parent_id, c.depth, c.user_id,
                c.user_name, c.user_email, c.user_url,
                c.comment, c.notify_by_email, c.ip_address,
                c.is_public, c.is_removed,
                c.created_at, c.last_modified_at,
                a.username AS account_username,
                a.email AS account_email,
                a.full_name AS account_full_name
            FROM {} c
            LEFT JOIN accounts a ON a.id = c.user_id
            "#,
            self.comments
        ))
    }

    async fn fetch_comments(
        &self,
        mut query: QueryBuilder<'_, Sqlite>,
        filter: &CommentFilter,
    ) -> domain::Result<Vec<Comment>> {
        if let Some(is_public) = filter.is_public {
            query.push(" AND c.is_public = ").push_bind(is_public);
        }
        if let Some(is_removed) = filter.is_removed {
            query.push(" AND c.is_removed = ").push_bind(is_removed);
        }
        query.push(" ORDER BY c.created_at ASC, c.rowid ASC");

        let rows = query
            .build_query_as::<SqlComment>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list comments")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Validates and stores a new comment stamped with `site_id`.
    pub async fn create_comment(
        &self,
        site_id: &SiteId,
        draft: CommentDraft,
        max_length: usize,
    ) -> domain::Result<Comment> {
        draft.validate(max_length)?;

        if self.get_post(site_id, &draft.post_slug).await?.is_none() {
            return Err(Error::not_found("post", draft.post_slug.as_str()));
        }
        let mut depth = 0;
        if let Some(parent_id) = &draft.parent_id {
            let (same_post, parent_depth) = self
                .get_comment(parent_id)
                .await?
                .map(|parent| {
                    (
                        parent.site_id == *site_id && parent.post_slug == draft.post_slug,
                        parent.depth,
                    )
                })
                .ok_or_else(|| Error::not_found("comment", parent_id.as_str()))?;
            if !same_post {
                return Err(Error::invalid("parent", "Replies must stay on the same post."));
            }
            depth = parent_depth + 1;
            if depth > Comment::MAX_DEPTH {
                return Err(Error::invalid(
                    "parent",
                    format!("Replies cannot nest more than {} levels deep.", Comment::MAX_DEPTH),
                ));
            }
        }

        let mut comment = draft.into_comment(
            CommentId::new(Uuid::new_v4().to_string()),
            site_id.clone(),
            Utc::now().naive_utc(),
        );
        comment.depth = depth;

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (
                id, site_id, post_slug, parent_id, depth, user_id,
                user_name, user_email, user_url,
                comment, notify_by_email, ip_address,
                is_public, is_removed, created_at, last_modified_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            self.comments
        ))
        .bind(comment.id.as_str())
        .bind(comment.site_id.as_str())
        .bind(&comment.post_slug)
        .bind(comment.parent_id.as_ref().map(CommentId::as_str))
        .bind(comment.depth)
        .bind(comment.user.as_ref().map(|u| u.id.as_str()))
        .bind(&comment.user_name)
        .bind(&comment.user_email)
        .bind(&comment.user_url)
        .bind(&comment.comment)
        .bind(comment.notify_by_email)
        .bind(comment.ip_address.map(|ip| ip.to_string()))
        .bind(comment.is_public)
        .bind(comment.is_removed)
        .bind(comment.created_at)
        .bind(comment.last_modified_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert comment")?;

        tracing::info!(
            "Comment {} created on {}/{}",
            comment.id,
            comment.site_id,
            comment.post_slug
        );
        Ok(comment)
    }

    pub async fn get_comment(&self, id: &CommentId) -> domain::Result<Option<Comment>> {
        let mut query = self.select_comments();
        query.push(" WHERE c.id = ").push_bind(id.as_str());

        let row = query
            .build_query_as::<SqlComment>()
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load comment")?;

        Ok(row.map(Into::into))
    }

    /// Flips `is_removed`. Permission checks are the caller's business.
    pub async fn toggle_removed(&self, id: &CommentId) -> domain::Result<Comment> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_removed = NOT is_removed, last_modified_at = ? WHERE id = ?",
            self.comments
        ))
        .bind(Utc::now().naive_utc())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to toggle comment")?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("comment", id.as_str()));
        }
        self.get_comment(id)
            .await?
            .ok_or_else(|| Error::not_found("comment", id.as_str()))
    }

    pub async fn set_public(&self, id: &CommentId, is_public: bool) -> domain::Result<Comment> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_public = ?, last_modified_at = ? WHERE id = ?",
            self.comments
        ))
        .bind(is_public)
        .bind(Utc::now().naive_utc())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update comment visibility")?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("comment", id.as_str()));
        }
        self.get_comment(id)
            .await?
            .ok_or_else(|| Error::not_found("comment", id.as_str()))
    }

    /// Top-level comments of a post, oldest first.
    pub async fn roots_of(
        &self,
        site_id: &SiteId,
        slug: &str,
        filter: CommentFilter,
    ) -> domain::Result<Vec<Comment>> {
        let mut query = self.select_comments();
        query
            .push(" WHERE c.site_id = ")
            .push_bind(site_id.as_str())
            .push(" AND c.post_slug = ")
            .push_bind(slug)
            .push(" AND c.parent_id IS NULL");
        self.fetch_comments(query, &filter).await
    }

    /// Direct replies, oldest first.
    pub async fn children_of(
        &self,
        parent_id: &CommentId,
        filter: CommentFilter,
    ) -> domain::Result<Vec<Comment>> {
        let mut query = self.select_comments();
        query.push(" WHERE c.parent_id = ").push_bind(parent_id.as_str());
        self.fetch_comments(query, &filter).await
    }

    /// Every comment of a post at any depth, oldest first.
    pub async fn list_comments(
        &self,
        site_id: &SiteId,
        slug: &str,
        filter: CommentFilter,
    ) -> domain::Result<Vec<Comment>> {
        let mut query = self.select_comments();
        query
            .push(" WHERE c.site_id = ")
            .push_bind(site_id.as_str())
            .push(" AND c.post_slug = ")
            .push_bind(slug);
        self.fetch_comments(query, &filter).await
    }
}

use crate::{models::SqlPost, Db};
use anyhow::Context;
use chrono::Utc;
use domain::{Post, SiteId};

impl Db {
    /// Registers a post as a comment container. Comments are enabled on new posts; an existing
    /// post only gets its title updated.
    pub async fn ensure_post(&self, site_id: &SiteId, slug: &str, title: &str) -> domain::Result<Post> {
        sqlx::query(
            r#"
            INSERT INTO posts (site_id, slug, title, can_comment, created_at)
            VALUES (?, ?, ?, TRUE, ?)
            ON CONFLICT(site_id, slug) DO UPDATE SET title = excluded.title
            "#,
        )
        .bind(site_id.as_str())
        .bind(slug)
        .bind(title)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .context("Failed to ensure post")?;

        self.get_post(site_id, slug)
            .await?
            .ok_or_else(|| domain::Error::not_found("post", slug))
    }

    pub async fn get_post(&self, site_id: &SiteId, slug: &str) -> domain::Result<Option<Post>> {
        let row = sqlx::query_as::<_, SqlPost>(
            "SELECT site_id, slug, title, can_comment FROM posts WHERE site_id = ? AND slug = ?",
        )
        .bind(site_id.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load post")?;

        Ok(row.map(Into::into))
    }

    pub async fn save_post(&self, post: &Post) -> domain::Result<()> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, can_comment = ? WHERE site_id = ? AND slug = ?",
        )
        .bind(&post.title)
        .bind(post.can_comment)
        .bind(post.site_id.as_str())
        .bind(&post.slug)
        .execute(&self.pool)
        .await
        .context("Failed to save post")?;

        if result.rows_affected() == 0 {
            return Err(domain::Error::not_found("post", post.slug.as_str()));
        }
        Ok(())
    }
}

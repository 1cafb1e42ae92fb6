use crate::Db;
use anyhow::Context;
use domain::SiteId;

impl Db {
    /// Registers a site; an existing one keeps its domain.
    pub async fn ensure_site(&self, site_id: &SiteId, domain: &str) -> domain::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sites (id, domain, name)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(site_id.as_str())
        .bind(domain)
        .bind(domain)
        .execute(&self.pool)
        .await
        .context("Failed to ensure site")?;
        Ok(())
    }
}

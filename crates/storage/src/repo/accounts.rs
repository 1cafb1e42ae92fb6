use crate::{models::SqlAccount, Db};
use anyhow::Context;
use domain::Account;

impl Db {
    pub async fn get_account(&self, id: &str) -> domain::Result<Option<Account>> {
        let row = sqlx::query_as::<_, SqlAccount>(
            "SELECT id, username, email, full_name FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load account")?;

        Ok(row.map(Into::into))
    }

    // mirror of the host identity system
    pub async fn upsert_account(&self, account: &Account) -> domain::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, full_name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                full_name = excluded.full_name
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.full_name)
        .execute(&self.pool)
        .await
        .context("Failed to upsert account")?;

        Ok(())
    }
}

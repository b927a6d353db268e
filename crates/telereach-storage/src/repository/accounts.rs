//! Account repository

use async_trait::async_trait;
use telereach_common::types::{AccountId, AccountSelection, AccountStatus, TenantId, Timestamp};
use telereach_common::{Error, Result};

use crate::db::DatabasePool;
use crate::models::Account;

/// Account repository trait
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Active accounts matching a campaign's account selection, in creation order
    async fn list_for_selection(
        &self,
        tenant_id: TenantId,
        selection: &AccountSelection,
    ) -> Result<Vec<Account>>;

    /// Atomically count one send attempt against the account's windows.
    /// Lifetime delivered count moves only when `delivered` is true.
    async fn record_send(&self, id: AccountId, delivered: bool, now: Timestamp) -> Result<()>;

    /// Zero the elapsed counter windows and stamp their reset times
    async fn reset_windows(
        &self,
        id: AccountId,
        reset_hour: bool,
        reset_day: bool,
        now: Timestamp,
    ) -> Result<()>;

    /// Persist a status transition; `session_expired` also clears the stored credential
    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<()>;
}

/// Database account repository
pub struct DbAccountRepository {
    pool: DatabasePool,
}

impl DbAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for DbAccountRepository {
    async fn list_for_selection(
        &self,
        tenant_id: TenantId,
        selection: &AccountSelection,
    ) -> Result<Vec<Account>> {
        let accounts = match selection {
            AccountSelection::Ids(ids) => sqlx::query_as::<_, Account>(
                r#"
                SELECT * FROM accounts
                WHERE tenant_id = $1 AND status = 'active' AND id = ANY($2)
                ORDER BY created_at ASC
                "#,
            )
            .bind(tenant_id)
            .bind(ids)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))?,
            _ => sqlx::query_as::<_, Account>(
                r#"
                SELECT * FROM accounts
                WHERE tenant_id = $1 AND status = 'active'
                ORDER BY created_at ASC
                "#,
            )
            .bind(tenant_id)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))?,
        };

        // Category derives from value_usdt in Rust, so that filter runs
        // after the fetch instead of duplicating the thresholds in SQL.
        Ok(match selection {
            AccountSelection::Categories(categories) => accounts
                .into_iter()
                .filter(|a| categories.contains(&a.category()))
                .collect(),
            _ => accounts,
        })
    }

    async fn record_send(&self, id: AccountId, delivered: bool, now: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                sent_this_hour = sent_this_hour + 1,
                sent_today = sent_today + 1,
                total_sent = total_sent + 1,
                total_delivered = total_delivered + CASE WHEN $2 THEN 1 ELSE 0 END,
                last_active = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(delivered)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn reset_windows(
        &self,
        id: AccountId,
        reset_hour: bool,
        reset_day: bool,
        now: Timestamp,
    ) -> Result<()> {
        if !reset_hour && !reset_day {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE accounts SET
                sent_this_hour = CASE WHEN $2 THEN 0 ELSE sent_this_hour END,
                last_hour_reset = CASE WHEN $2 THEN $4 ELSE last_hour_reset END,
                sent_today = CASE WHEN $3 THEN 0 ELSE sent_today END,
                last_day_reset = CASE WHEN $3 THEN $4 ELSE last_day_reset END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reset_hour)
        .bind(reset_day)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                status = $2,
                session_string = CASE WHEN $2 = 'session_expired' THEN NULL ELSE session_string END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

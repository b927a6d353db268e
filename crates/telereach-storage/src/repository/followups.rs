//! Follow-up queue repository

use async_trait::async_trait;
use telereach_common::types::{ContactId, FollowUpItemId, FollowUpStatus, TenantId, Timestamp};
use telereach_common::{Error, Result};

use crate::db::DatabasePool;
use crate::models::FollowUpItem;

/// Follow-up queue repository trait
#[async_trait]
pub trait FollowUpRepository: Send + Sync {
    /// Insert a new queue item
    async fn insert(&self, item: &FollowUpItem) -> Result<()>;

    /// Whether a pending item already exists for this contact
    async fn has_pending(&self, tenant_id: TenantId, contact_id: ContactId) -> Result<bool>;

    /// All pending items, soonest scheduled first
    async fn list_pending(&self, tenant_id: TenantId) -> Result<Vec<FollowUpItem>>;

    /// Pending items whose scheduled time has elapsed, soonest first
    async fn list_due(&self, tenant_id: TenantId, now: Timestamp) -> Result<Vec<FollowUpItem>>;

    /// Terminal transition to `sent`
    async fn mark_sent(&self, id: FollowUpItemId, now: Timestamp) -> Result<()>;

    /// Terminal transition to `failed` with the error stored on the item
    async fn mark_failed(&self, id: FollowUpItemId, error: &str, now: Timestamp) -> Result<()>;

    /// Cancel an item if (and only if) it is still pending; returns whether
    /// a row changed.
    async fn cancel_pending(&self, tenant_id: TenantId, id: FollowUpItemId) -> Result<bool>;

    /// Count items in the given status
    async fn count_by_status(&self, tenant_id: TenantId, status: FollowUpStatus) -> Result<i64>;
}

/// Database follow-up queue repository
pub struct DbFollowUpRepository {
    pool: DatabasePool,
}

impl DbFollowUpRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowUpRepository for DbFollowUpRepository {
    async fn insert(&self, item: &FollowUpItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO followup_queue (
                id, tenant_id, contact_id, contact_phone, contact_name,
                voice_message_id, voice_message_name, status, read_at,
                scheduled_at, completed_at, last_error, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(item.id)
        .bind(item.tenant_id)
        .bind(item.contact_id)
        .bind(&item.contact_phone)
        .bind(&item.contact_name)
        .bind(item.voice_message_id)
        .bind(&item.voice_message_name)
        .bind(&item.status)
        .bind(item.read_at)
        .bind(item.scheduled_at)
        .bind(item.completed_at)
        .bind(&item.last_error)
        .bind(item.created_at)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn has_pending(&self, tenant_id: TenantId, contact_id: ContactId) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM followup_queue
                WHERE tenant_id = $1 AND contact_id = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(tenant_id)
        .bind(contact_id)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(exists.0)
    }

    async fn list_pending(&self, tenant_id: TenantId) -> Result<Vec<FollowUpItem>> {
        sqlx::query_as::<_, FollowUpItem>(
            r#"
            SELECT * FROM followup_queue
            WHERE tenant_id = $1 AND status = 'pending'
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_due(&self, tenant_id: TenantId, now: Timestamp) -> Result<Vec<FollowUpItem>> {
        sqlx::query_as::<_, FollowUpItem>(
            r#"
            SELECT * FROM followup_queue
            WHERE tenant_id = $1 AND status = 'pending' AND scheduled_at <= $2
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn mark_sent(&self, id: FollowUpItemId, now: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE followup_queue SET
                status = 'sent',
                completed_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn mark_failed(&self, id: FollowUpItemId, error: &str, now: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE followup_queue SET
                status = 'failed',
                last_error = $2,
                completed_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn cancel_pending(&self, tenant_id: TenantId, id: FollowUpItemId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE followup_queue SET
                status = 'cancelled',
                completed_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self, tenant_id: TenantId, status: FollowUpStatus) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM followup_queue WHERE tenant_id = $1 AND status = $2",
        )
        .bind(tenant_id)
        .bind(status.to_string())
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count.0)
    }
}

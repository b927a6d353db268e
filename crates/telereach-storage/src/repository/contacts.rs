//! Contact repository

use async_trait::async_trait;
use telereach_common::types::{ContactId, ContactSelection, ContactStatus, TenantId, Timestamp};
use telereach_common::{Error, Result};

use crate::db::DatabasePool;
use crate::models::Contact;

/// Contact repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Pending contacts matching a campaign's contact selection, in creation order
    async fn list_for_selection(
        &self,
        tenant_id: TenantId,
        selection: &ContactSelection,
    ) -> Result<Vec<Contact>>;

    /// All contacts currently in the given status, in creation order
    async fn list_by_status(
        &self,
        tenant_id: TenantId,
        status: ContactStatus,
    ) -> Result<Vec<Contact>>;

    /// Count contacts currently in the given status
    async fn count_by_status(&self, tenant_id: TenantId, status: ContactStatus) -> Result<i64>;

    /// Advance a pending contact to `messaged` and stamp `last_contacted`
    async fn mark_messaged(&self, id: ContactId, now: Timestamp) -> Result<()>;

    /// Advance a read contact to `voice_sent`
    async fn mark_voice_sent(&self, id: ContactId) -> Result<()>;
}

/// Database contact repository
pub struct DbContactRepository {
    pool: DatabasePool,
}

impl DbContactRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for DbContactRepository {
    async fn list_for_selection(
        &self,
        tenant_id: TenantId,
        selection: &ContactSelection,
    ) -> Result<Vec<Contact>> {
        match selection {
            ContactSelection::AllPending => sqlx::query_as::<_, Contact>(
                r#"
                SELECT * FROM contacts
                WHERE tenant_id = $1 AND status = 'pending'
                ORDER BY created_at ASC
                "#,
            )
            .bind(tenant_id)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string())),
            ContactSelection::Ids(ids) => sqlx::query_as::<_, Contact>(
                r#"
                SELECT * FROM contacts
                WHERE tenant_id = $1 AND status = 'pending' AND id = ANY($2)
                ORDER BY created_at ASC
                "#,
            )
            .bind(tenant_id)
            .bind(ids)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string())),
            ContactSelection::Tag(tag) => sqlx::query_as::<_, Contact>(
                r#"
                SELECT * FROM contacts
                WHERE tenant_id = $1 AND status = 'pending' AND tags ? $2
                ORDER BY created_at ASC
                "#,
            )
            .bind(tenant_id)
            .bind(tag)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string())),
        }
    }

    async fn list_by_status(
        &self,
        tenant_id: TenantId,
        status: ContactStatus,
    ) -> Result<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE tenant_id = $1 AND status = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(status.to_string())
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn count_by_status(&self, tenant_id: TenantId, status: ContactStatus) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE tenant_id = $1 AND status = $2")
                .bind(tenant_id)
                .bind(status.to_string())
                .fetch_one(self.pool.pool())
                .await
                .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count.0)
    }

    async fn mark_messaged(&self, id: ContactId, now: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contacts SET
                status = 'messaged',
                last_contacted = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn mark_voice_sent(&self, id: ContactId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contacts SET
                status = 'voice_sent',
                updated_at = NOW()
            WHERE id = $1 AND status = 'read'
            "#,
        )
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

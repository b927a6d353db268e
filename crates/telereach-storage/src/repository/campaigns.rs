//! Campaign repository

use async_trait::async_trait;
use telereach_common::types::{CampaignId, CampaignStatus, TenantId};
use telereach_common::{Error, Result};

use crate::db::DatabasePool;
use crate::models::Campaign;

/// Campaign repository trait
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Get a campaign by id within a tenant scope
    async fn get(&self, tenant_id: TenantId, id: CampaignId) -> Result<Option<Campaign>>;

    /// Update campaign status. Moving to `running` stamps `started_at`;
    /// terminal states stamp `completed_at`.
    async fn update_status(&self, id: CampaignId, status: CampaignStatus) -> Result<()>;

    /// Persist the aggregate counters of a finished run together with its
    /// terminal status.
    async fn record_run(
        &self,
        id: CampaignId,
        sent: i32,
        delivered: i32,
        failed: i32,
        status: CampaignStatus,
    ) -> Result<()>;
}

/// Database campaign repository
pub struct DbCampaignRepository {
    pool: DatabasePool,
}

impl DbCampaignRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for DbCampaignRepository {
    async fn get(&self, tenant_id: TenantId, id: CampaignId) -> Result<Option<Campaign>> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn update_status(&self, id: CampaignId, status: CampaignStatus) -> Result<()> {
        let started = status == CampaignStatus::Running;
        let completed = matches!(
            status,
            CampaignStatus::Completed | CampaignStatus::Cancelled
        );

        sqlx::query(
            r#"
            UPDATE campaigns SET
                status = $2,
                started_at = CASE WHEN $3 THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(started)
        .bind(completed)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn record_run(
        &self,
        id: CampaignId,
        sent: i32,
        delivered: i32,
        failed: i32,
        status: CampaignStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                sent_count = $2,
                delivered_count = $3,
                failed_count = $4,
                status = $5,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(sent)
        .bind(delivered)
        .bind(failed)
        .bind(status.to_string())
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

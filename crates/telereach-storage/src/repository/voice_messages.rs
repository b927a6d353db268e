//! Voice message repository

use async_trait::async_trait;
use telereach_common::types::{TenantId, VoiceMessageId};
use telereach_common::{Error, Result};

use crate::db::DatabasePool;
use crate::models::VoiceMessage;

/// Voice message repository trait
#[async_trait]
pub trait VoiceMessageRepository: Send + Sync {
    /// Get a voice message by id within a tenant scope
    async fn get(&self, tenant_id: TenantId, id: VoiceMessageId) -> Result<Option<VoiceMessage>>;

    /// Bump the lifetime send counter
    async fn increment_sent(&self, id: VoiceMessageId) -> Result<()>;
}

/// Database voice message repository
pub struct DbVoiceMessageRepository {
    pool: DatabasePool,
}

impl DbVoiceMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoiceMessageRepository for DbVoiceMessageRepository {
    async fn get(&self, tenant_id: TenantId, id: VoiceMessageId) -> Result<Option<VoiceMessage>> {
        sqlx::query_as::<_, VoiceMessage>(
            "SELECT * FROM voice_messages WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn increment_sent(&self, id: VoiceMessageId) -> Result<()> {
        sqlx::query("UPDATE voice_messages SET sent_count = sent_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

//! Dialog repository

use async_trait::async_trait;
use telereach_common::types::{ContactId, MessageDirection, TenantId};
use telereach_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{Dialog, MessageEntry};

/// Dialog repository trait
#[async_trait]
pub trait DialogRepository: Send + Sync {
    /// Append one entry to the contact's dialog, creating the dialog on
    /// first append. At most one dialog exists per contact; `has_response`
    /// flips true only when an incoming entry lands.
    async fn append_message(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
        contact_phone: &str,
        contact_name: Option<&str>,
        entry: &MessageEntry,
    ) -> Result<()>;

    /// Fetch the dialog for a contact, if one exists
    async fn get_by_contact(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
    ) -> Result<Option<Dialog>>;
}

/// Database dialog repository
pub struct DbDialogRepository {
    pool: DatabasePool,
}

impl DbDialogRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DialogRepository for DbDialogRepository {
    async fn append_message(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
        contact_phone: &str,
        contact_name: Option<&str>,
        entry: &MessageEntry,
    ) -> Result<()> {
        let entry_json = serde_json::to_value(entry)
            .map_err(|e| Error::Internal(format!("Failed to serialize dialog entry: {}", e)))?;
        let inbound = entry.direction == MessageDirection::Incoming;

        sqlx::query(
            r#"
            INSERT INTO dialogs (
                id, tenant_id, contact_id, contact_phone, contact_name,
                account_id, account_phone, messages, has_response, last_message_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, jsonb_build_array($8::jsonb), $9, $10)
            ON CONFLICT (contact_id) DO UPDATE SET
                messages = dialogs.messages || EXCLUDED.messages,
                account_id = COALESCE(EXCLUDED.account_id, dialogs.account_id),
                account_phone = COALESCE(EXCLUDED.account_phone, dialogs.account_phone),
                has_response = dialogs.has_response OR EXCLUDED.has_response,
                last_message_at = EXCLUDED.last_message_at,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(contact_id)
        .bind(contact_phone)
        .bind(contact_name)
        .bind(entry.account_id)
        .bind(entry.account_phone.as_deref())
        .bind(&entry_json)
        .bind(inbound)
        .bind(entry.sent_at)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_by_contact(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
    ) -> Result<Option<Dialog>> {
        sqlx::query_as::<_, Dialog>(
            "SELECT * FROM dialogs WHERE tenant_id = $1 AND contact_id = $2",
        )
        .bind(tenant_id)
        .bind(contact_id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}

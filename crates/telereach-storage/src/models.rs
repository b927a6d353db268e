//! Database models for Telereach

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use telereach_common::types::{
    AccountCategory, AccountId, AccountSelection, AccountStatus, CampaignStatus, ContactId,
    ContactSelection, ContactStatus, FollowUpItemId, FollowUpStatus, MessageDirection,
    MessageKind, ProxyConfig, TenantId, VoiceMessageId,
};

/// Messaging account model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub tenant_id: TenantId,
    pub phone: String,
    pub username: Option<String>,
    pub status: String,
    /// Opaque transport credential; absent or empty means the account
    /// cannot send.
    pub session_string: Option<String>,
    pub proxy: Option<serde_json::Value>,
    pub value_usdt: f64,
    pub max_per_hour: i32,
    pub max_per_day: i32,
    pub delay_min_seconds: i32,
    pub delay_max_seconds: i32,
    pub sent_this_hour: i32,
    pub sent_today: i32,
    pub last_hour_reset: Option<DateTime<Utc>>,
    pub last_day_reset: Option<DateTime<Utc>>,
    pub total_sent: i64,
    pub total_delivered: i64,
    pub last_active: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Get status enum
    pub fn status_enum(&self) -> Option<AccountStatus> {
        self.status.parse().ok()
    }

    /// Value category derived from the account's market value
    pub fn category(&self) -> AccountCategory {
        AccountCategory::from_value(self.value_usdt)
    }

    /// Parse the proxy column into a typed config
    pub fn proxy_config(&self) -> Option<ProxyConfig> {
        self.proxy
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether the account is active and holds a usable credential
    pub fn is_authorized(&self) -> bool {
        self.status_enum() == Some(AccountStatus::Active)
            && self
                .session_string
                .as_deref()
                .map(|s| !s.is_empty())
                .unwrap_or(false)
    }
}

/// Contact model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub tenant_id: TenantId,
    pub phone: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub tags: serde_json::Value,
    pub status: String,
    pub last_contacted: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Get status enum
    pub fn status_enum(&self) -> Option<ContactStatus> {
        self.status.parse().ok()
    }

    /// Get tags as a vector
    pub fn tags_vec(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }
}

/// Campaign model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: uuid::Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub message_template: String,
    /// JSONB array of account ids; ignored when categories are given
    pub account_ids: serde_json::Value,
    /// JSONB array of category names; takes precedence over explicit ids
    pub account_categories: serde_json::Value,
    /// JSONB array of contact ids; takes precedence over the tag filter
    pub contact_ids: Option<serde_json::Value>,
    pub tag_filter: Option<String>,
    pub use_rotation: bool,
    pub respect_limits: bool,
    pub status: String,
    pub total_contacts: i32,
    pub sent_count: i32,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub responses_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Get status enum
    pub fn status_enum(&self) -> Option<CampaignStatus> {
        self.status.parse().ok()
    }

    /// Get explicit account ids as a vector
    pub fn account_ids_vec(&self) -> Vec<AccountId> {
        serde_json::from_value(self.account_ids.clone()).unwrap_or_default()
    }

    /// Get account categories as a vector
    pub fn account_categories_vec(&self) -> Vec<AccountCategory> {
        serde_json::from_value(self.account_categories.clone()).unwrap_or_default()
    }

    /// Get explicit contact ids as a vector, if any were set
    pub fn contact_ids_vec(&self) -> Vec<ContactId> {
        self.contact_ids
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Which accounts this campaign draws from; categories win over ids
    pub fn account_selection(&self) -> AccountSelection {
        let categories = self.account_categories_vec();
        if !categories.is_empty() {
            return AccountSelection::Categories(categories);
        }
        let ids = self.account_ids_vec();
        if !ids.is_empty() {
            return AccountSelection::Ids(ids);
        }
        AccountSelection::All
    }

    /// Which contacts this campaign targets; explicit ids win over the tag filter
    pub fn contact_selection(&self) -> ContactSelection {
        let ids = self.contact_ids_vec();
        if !ids.is_empty() {
            return ContactSelection::Ids(ids);
        }
        if let Some(tag) = self.tag_filter.as_deref() {
            if !tag.is_empty() {
                return ContactSelection::Tag(tag.to_string());
            }
        }
        ContactSelection::AllPending
    }
}

/// Delivery state of a single dialog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Delivered,
    Failed,
}

/// One message in a dialog history, stored as JSONB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub id: uuid::Uuid,
    pub direction: MessageDirection,
    pub kind: MessageKind,
    pub text: String,
    pub status: EntryStatus,
    pub error: Option<String>,
    pub remote_message_id: Option<i64>,
    pub account_id: Option<AccountId>,
    pub account_phone: Option<String>,
    pub account_category: Option<AccountCategory>,
    pub sent_at: DateTime<Utc>,
}

/// Dialog model: append-only per-contact message history.
/// At most one dialog exists per contact; appends upsert.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Dialog {
    pub id: uuid::Uuid,
    pub tenant_id: TenantId,
    pub contact_id: ContactId,
    pub contact_phone: String,
    pub contact_name: Option<String>,
    /// Most recent sending account
    pub account_id: Option<AccountId>,
    pub account_phone: Option<String>,
    pub messages: serde_json::Value,
    pub has_response: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dialog {
    /// Get message entries as a vector
    pub fn messages_vec(&self) -> Vec<MessageEntry> {
        serde_json::from_value(self.messages.clone()).unwrap_or_default()
    }
}

/// Stored voice asset referenced by follow-up queue items
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VoiceMessage {
    pub id: VoiceMessageId,
    pub tenant_id: TenantId,
    pub name: String,
    pub path: String,
    pub duration_seconds: i32,
    /// Minutes between a contact's read time and the scheduled follow-up
    pub delay_minutes: i32,
    pub is_active: bool,
    pub sent_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Follow-up queue item model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FollowUpItem {
    pub id: FollowUpItemId,
    pub tenant_id: TenantId,
    pub contact_id: ContactId,
    pub contact_phone: String,
    pub contact_name: Option<String>,
    pub voice_message_id: VoiceMessageId,
    pub voice_message_name: String,
    pub status: String,
    pub read_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FollowUpItem {
    /// Get status enum
    pub fn status_enum(&self) -> Option<FollowUpStatus> {
        self.status.parse().ok()
    }
}

//! Delivery gateway abstraction - the transport seam between the engine and Telegram

mod sessions;

pub use sessions::SessionCache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use telereach_common::types::{AccountId, AccountStatus, ProxyConfig};
use telereach_common::Result;
use telereach_storage::models::Account;

/// Credential material the gateway needs to act as an account
#[derive(Debug, Clone)]
pub struct AccountCredential {
    pub account_id: AccountId,
    pub phone: String,
    pub session_string: String,
}

impl AccountCredential {
    /// Build a credential from an authorized account.
    ///
    /// Returns `None` when the account carries no session material.
    pub fn from_account(account: &Account) -> Option<Self> {
        let session_string = account.session_string.clone()?;
        if session_string.is_empty() {
            return None;
        }
        Some(Self {
            account_id: account.id,
            phone: account.phone.clone(),
            session_string,
        })
    }
}

/// Classification of a single delivery attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The message reached the recipient
    Sent {
        remote_message_id: i64,
        timestamp: DateTime<Utc>,
    },
    /// The attempt failed but the account remains usable
    Recoverable {
        reason: String,
        /// Present on flood-wait style throttling; the account must rest this long
        retry_after_seconds: Option<u64>,
    },
    /// The account itself is no longer usable
    Fatal { kind: FatalKind, reason: String },
}

/// Why an account became unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// The platform banned the account
    Banned,
    /// The stored session is no longer valid
    SessionExpired,
    /// The platform rejected the credential outright
    Unauthorized,
}

impl FatalKind {
    /// Account status to persist for this failure
    ///
    /// A rejected credential lands on `session_expired` like an invalidated
    /// one; both mean the account needs a fresh login.
    pub fn account_status(self) -> AccountStatus {
        match self {
            FatalKind::Banned => AccountStatus::Banned,
            FatalKind::SessionExpired | FatalKind::Unauthorized => {
                AccountStatus::SessionExpired
            }
        }
    }
}

/// Transport used to deliver messages on behalf of an account
///
/// Implementations own connection handling and error mapping; the engine only
/// sees the classified outcome. Errors returned here mean the gateway could
/// not complete the attempt at all and are treated as recoverable.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Send a text message to a recipient phone number
    async fn send_text(
        &self,
        credential: &AccountCredential,
        proxy: Option<&ProxyConfig>,
        recipient_phone: &str,
        text: &str,
    ) -> Result<SendOutcome>;

    /// Send a pre-recorded voice message to a recipient phone number
    async fn send_voice(
        &self,
        credential: &AccountCredential,
        proxy: Option<&ProxyConfig>,
        recipient_phone: &str,
        asset_path: &str,
    ) -> Result<SendOutcome>;
}

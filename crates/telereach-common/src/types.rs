//! Common types for Telereach

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for tenants
pub type TenantId = Uuid;

/// Unique identifier for messaging accounts
pub type AccountId = Uuid;

/// Unique identifier for contacts
pub type ContactId = Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for dialogs
pub type DialogId = Uuid;

/// Unique identifier for voice messages
pub type VoiceMessageId = Uuid;

/// Unique identifier for follow-up queue items
pub type FollowUpItemId = Uuid;

/// Unique identifier for a single campaign run
pub type RunId = Uuid;

/// Timestamp wrapper
pub type Timestamp = DateTime<Utc>;

/// Authorization status of a messaging account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    Active,
    Banned,
    SessionExpired,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "pending"),
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Banned => write!(f, "banned"),
            AccountStatus::SessionExpired => write!(f, "session_expired"),
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AccountStatus::Pending),
            "active" => Ok(AccountStatus::Active),
            "banned" => Ok(AccountStatus::Banned),
            "session_expired" => Ok(AccountStatus::SessionExpired),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }
}

/// Contact status along the outreach funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Pending,
    Messaged,
    Read,
    Responded,
    VoiceSent,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactStatus::Pending => write!(f, "pending"),
            ContactStatus::Messaged => write!(f, "messaged"),
            ContactStatus::Read => write!(f, "read"),
            ContactStatus::Responded => write!(f, "responded"),
            ContactStatus::VoiceSent => write!(f, "voice_sent"),
        }
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContactStatus::Pending),
            "messaged" => Ok(ContactStatus::Messaged),
            "read" => Ok(ContactStatus::Read),
            "responded" => Ok(ContactStatus::Responded),
            "voice_sent" => Ok(ContactStatus::VoiceSent),
            _ => Err(format!("Invalid contact status: {}", s)),
        }
    }
}

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Running,
    Completed,
    Cancelled,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Running => write!(f, "running"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "running" => Ok(CampaignStatus::Running),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            _ => Err(format!("Invalid campaign status: {}", s)),
        }
    }
}

/// Follow-up queue item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStatus {
    Pending,
    Sent,
    Failed,
    Cancelled,
}

impl std::fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowUpStatus::Pending => write!(f, "pending"),
            FollowUpStatus::Sent => write!(f, "sent"),
            FollowUpStatus::Failed => write!(f, "failed"),
            FollowUpStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for FollowUpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FollowUpStatus::Pending),
            "sent" => Ok(FollowUpStatus::Sent),
            "failed" => Ok(FollowUpStatus::Failed),
            "cancelled" => Ok(FollowUpStatus::Cancelled),
            _ => Err(format!("Invalid follow-up status: {}", s)),
        }
    }
}

/// Account value bracket below which an account counts as low value (USDT)
pub const CATEGORY_MEDIUM_MIN_USDT: f64 = 300.0;

/// Account value bracket at or above which an account counts as high value (USDT)
pub const CATEGORY_HIGH_MIN_USDT: f64 = 500.0;

/// Value category of an account, derived from its market value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    Low,
    Medium,
    High,
}

impl AccountCategory {
    /// Derive the category from an account's value in USDT
    pub fn from_value(value_usdt: f64) -> Self {
        if value_usdt >= CATEGORY_HIGH_MIN_USDT {
            AccountCategory::High
        } else if value_usdt >= CATEGORY_MEDIUM_MIN_USDT {
            AccountCategory::Medium
        } else {
            AccountCategory::Low
        }
    }

    /// Value bounds `[min, max)` covered by this category, upper bound open-ended for `High`
    pub fn value_bounds(&self) -> (f64, Option<f64>) {
        match self {
            AccountCategory::Low => (0.0, Some(CATEGORY_MEDIUM_MIN_USDT)),
            AccountCategory::Medium => (CATEGORY_MEDIUM_MIN_USDT, Some(CATEGORY_HIGH_MIN_USDT)),
            AccountCategory::High => (CATEGORY_HIGH_MIN_USDT, None),
        }
    }
}

impl std::fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountCategory::Low => write!(f, "low"),
            AccountCategory::Medium => write!(f, "medium"),
            AccountCategory::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for AccountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AccountCategory::Low),
            "medium" => Ok(AccountCategory::Medium),
            "high" => Ok(AccountCategory::High),
            _ => Err(format!("Invalid account category: {}", s)),
        }
    }
}

/// Direction of a dialog message entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Outgoing,
    Incoming,
}

impl std::fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageDirection::Outgoing => write!(f, "outgoing"),
            MessageDirection::Incoming => write!(f, "incoming"),
        }
    }
}

/// Payload kind of a dialog message entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Voice,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Voice => write!(f, "voice"),
        }
    }
}

/// Per-account proxy configuration handed to the delivery gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy scheme: "socks5" or "http"
    #[serde(default = "default_proxy_scheme")]
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_proxy_scheme() -> String {
    "socks5".to_string()
}

/// Which accounts a campaign draws from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountSelection {
    /// Every active account in the tenant scope
    All,
    /// Explicit account id list
    Ids(Vec<AccountId>),
    /// Accounts whose value falls in one of these categories
    Categories(Vec<AccountCategory>),
}

/// Which contacts a campaign targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactSelection {
    /// Every pending contact in the tenant scope
    AllPending,
    /// Explicit contact id list
    Ids(Vec<ContactId>),
    /// Pending contacts carrying this tag
    Tag(String),
}

//! Shared fixtures for engine integration tests
//!
//! The in-memory store mirrors the SQL repositories closely enough that the
//! engine cannot tell them apart: same filters, same ordering, same guarded
//! status transitions. The mock gateway replays a scripted list of outcomes
//! and records every call it sees.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use telereach_common::config::{EngineConfig, FollowUpConfig};
use telereach_common::types::{
    AccountCategory, AccountId, AccountSelection, AccountStatus, CampaignId, CampaignStatus,
    ContactId, ContactSelection, ContactStatus, FollowUpItemId, FollowUpStatus, ProxyConfig,
    TenantId, Timestamp, VoiceMessageId,
};
use telereach_common::Result;
use telereach_core::campaign::{AccountLeaseRegistry, CampaignExecutor, CampaignService};
use telereach_core::followup::FollowUpManager;
use telereach_core::gateway::{AccountCredential, DeliveryGateway, SendOutcome};
use telereach_storage::models::{
    Account, Campaign, Contact, Dialog, FollowUpItem, MessageEntry, VoiceMessage,
};
use telereach_storage::{
    AccountRepositoryTrait, CampaignRepositoryTrait, ContactRepositoryTrait,
    DialogRepositoryTrait, FollowUpRepositoryTrait, VoiceMessageRepositoryTrait,
};

static CREATED_SEQ: AtomicI64 = AtomicI64::new(0);

/// Monotonic creation stamp so list ordering is deterministic in tests
fn next_created_at() -> Timestamp {
    let seq = CREATED_SEQ.fetch_add(1, Ordering::Relaxed);
    Utc::now() + Duration::milliseconds(seq)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// ---------------------------------------------------------------------------
// Fixtures

pub fn make_account(tenant_id: TenantId, phone: &str) -> Account {
    let created = next_created_at();
    Account {
        id: Uuid::new_v4(),
        tenant_id,
        phone: phone.to_string(),
        username: None,
        status: "active".to_string(),
        session_string: Some(format!("session-{}", phone)),
        proxy: None,
        value_usdt: 100.0,
        max_per_hour: 20,
        max_per_day: 100,
        delay_min_seconds: 0,
        delay_max_seconds: 0,
        sent_this_hour: 0,
        sent_today: 0,
        last_hour_reset: Some(created),
        last_day_reset: Some(created),
        total_sent: 0,
        total_delivered: 0,
        last_active: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn make_contact(tenant_id: TenantId, phone: &str, name: Option<&str>) -> Contact {
    let created = next_created_at();
    Contact {
        id: Uuid::new_v4(),
        tenant_id,
        phone: phone.to_string(),
        name: name.map(|n| n.to_string()),
        username: None,
        tags: serde_json::json!([]),
        status: "pending".to_string(),
        last_contacted: None,
        read_at: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn make_read_contact(tenant_id: TenantId, phone: &str, name: Option<&str>) -> Contact {
    let mut contact = make_contact(tenant_id, phone, name);
    contact.status = "read".to_string();
    contact.read_at = Some(Utc::now() - Duration::hours(1));
    contact
}

pub fn make_campaign(tenant_id: TenantId) -> Campaign {
    let created = next_created_at();
    Campaign {
        id: Uuid::new_v4(),
        tenant_id,
        name: "spring outreach".to_string(),
        message_template: "Hi {name}".to_string(),
        account_ids: serde_json::json!([]),
        account_categories: serde_json::json!([]),
        contact_ids: None,
        tag_filter: None,
        use_rotation: true,
        respect_limits: true,
        status: "draft".to_string(),
        total_contacts: 0,
        sent_count: 0,
        delivered_count: 0,
        failed_count: 0,
        responses_count: 0,
        created_at: created,
        updated_at: created,
        started_at: None,
        completed_at: None,
    }
}

pub fn make_voice(tenant_id: TenantId, name: &str) -> VoiceMessage {
    VoiceMessage {
        id: Uuid::new_v4(),
        tenant_id,
        name: name.to_string(),
        path: format!("/voice/{}.ogg", name),
        duration_seconds: 12,
        delay_minutes: 30,
        is_active: true,
        sent_count: 0,
        created_at: next_created_at(),
    }
}

// ---------------------------------------------------------------------------
// In-memory store

#[derive(Default)]
pub struct MemoryStore {
    pub accounts: Mutex<Vec<Account>>,
    pub contacts: Mutex<Vec<Contact>>,
    pub campaigns: Mutex<Vec<Campaign>>,
    pub dialogs: Mutex<Vec<Dialog>>,
    pub voice_messages: Mutex<Vec<VoiceMessage>>,
    pub followups: Mutex<Vec<FollowUpItem>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_account(&self, account: Account) -> AccountId {
        let id = account.id;
        self.accounts.lock().unwrap().push(account);
        id
    }

    pub fn add_contact(&self, contact: Contact) -> ContactId {
        let id = contact.id;
        self.contacts.lock().unwrap().push(contact);
        id
    }

    pub fn add_campaign(&self, campaign: Campaign) -> CampaignId {
        let id = campaign.id;
        self.campaigns.lock().unwrap().push(campaign);
        id
    }

    pub fn add_voice(&self, voice: VoiceMessage) -> VoiceMessageId {
        let id = voice.id;
        self.voice_messages.lock().unwrap().push(voice);
        id
    }

    pub fn add_followup(&self, item: FollowUpItem) -> FollowUpItemId {
        let id = item.id;
        self.followups.lock().unwrap().push(item);
        id
    }

    pub fn remove_voice(&self, id: VoiceMessageId) {
        self.voice_messages.lock().unwrap().retain(|v| v.id != id);
    }

    pub fn account(&self, id: AccountId) -> Account {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .expect("account not in store")
    }

    pub fn contact(&self, id: ContactId) -> Contact {
        self.contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("contact not in store")
    }

    pub fn campaign(&self, id: CampaignId) -> Campaign {
        self.campaigns
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("campaign not in store")
    }

    pub fn voice(&self, id: VoiceMessageId) -> VoiceMessage {
        self.voice_messages
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .expect("voice message not in store")
    }

    pub fn dialog_for(&self, contact_id: ContactId) -> Option<Dialog> {
        self.dialogs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.contact_id == contact_id)
            .cloned()
    }

    pub fn followup_items(&self) -> Vec<FollowUpItem> {
        self.followups.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountRepositoryTrait for MemoryStore {
    async fn list_for_selection(
        &self,
        tenant_id: TenantId,
        selection: &AccountSelection,
    ) -> Result<Vec<Account>> {
        let accounts = self.accounts.lock().unwrap();
        let mut out: Vec<Account> = accounts
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.status == "active")
            .filter(|a| match selection {
                AccountSelection::All => true,
                AccountSelection::Ids(ids) => ids.contains(&a.id),
                AccountSelection::Categories(categories) => categories.contains(&a.category()),
            })
            .cloned()
            .collect();
        out.sort_by_key(|a| a.created_at);
        Ok(out)
    }

    async fn record_send(&self, id: AccountId, delivered: bool, now: Timestamp) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
            account.sent_this_hour += 1;
            account.sent_today += 1;
            account.total_sent += 1;
            if delivered {
                account.total_delivered += 1;
            }
            account.last_active = Some(now);
            account.updated_at = now;
        }
        Ok(())
    }

    async fn reset_windows(
        &self,
        id: AccountId,
        reset_hour: bool,
        reset_day: bool,
        now: Timestamp,
    ) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
            if reset_hour {
                account.sent_this_hour = 0;
                account.last_hour_reset = Some(now);
            }
            if reset_day {
                account.sent_today = 0;
                account.last_day_reset = Some(now);
            }
        }
        Ok(())
    }

    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
            account.status = status.to_string();
            if status == AccountStatus::SessionExpired {
                account.session_string = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepositoryTrait for MemoryStore {
    async fn list_for_selection(
        &self,
        tenant_id: TenantId,
        selection: &ContactSelection,
    ) -> Result<Vec<Contact>> {
        let contacts = self.contacts.lock().unwrap();
        let mut out: Vec<Contact> = contacts
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.status == "pending")
            .filter(|c| match selection {
                ContactSelection::AllPending => true,
                ContactSelection::Ids(ids) => ids.contains(&c.id),
                ContactSelection::Tag(tag) => c.tags_vec().iter().any(|t| t == tag),
            })
            .cloned()
            .collect();
        out.sort_by_key(|c| c.created_at);
        Ok(out)
    }

    async fn list_by_status(
        &self,
        tenant_id: TenantId,
        status: ContactStatus,
    ) -> Result<Vec<Contact>> {
        let status = status.to_string();
        let contacts = self.contacts.lock().unwrap();
        let mut out: Vec<Contact> = contacts
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.status == status)
            .cloned()
            .collect();
        out.sort_by_key(|c| c.created_at);
        Ok(out)
    }

    async fn count_by_status(&self, tenant_id: TenantId, status: ContactStatus) -> Result<i64> {
        let status = status.to_string();
        let contacts = self.contacts.lock().unwrap();
        Ok(contacts
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.status == status)
            .count() as i64)
    }

    async fn mark_messaged(&self, id: ContactId, now: Timestamp) -> Result<()> {
        let mut contacts = self.contacts.lock().unwrap();
        if let Some(contact) = contacts
            .iter_mut()
            .find(|c| c.id == id && c.status == "pending")
        {
            contact.status = "messaged".to_string();
            contact.last_contacted = Some(now);
            contact.updated_at = now;
        }
        Ok(())
    }

    async fn mark_voice_sent(&self, id: ContactId) -> Result<()> {
        let mut contacts = self.contacts.lock().unwrap();
        if let Some(contact) = contacts
            .iter_mut()
            .find(|c| c.id == id && c.status == "read")
        {
            contact.status = "voice_sent".to_string();
            contact.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl CampaignRepositoryTrait for MemoryStore {
    async fn get(&self, tenant_id: TenantId, id: CampaignId) -> Result<Option<Campaign>> {
        let campaigns = self.campaigns.lock().unwrap();
        Ok(campaigns
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == id)
            .cloned())
    }

    async fn update_status(&self, id: CampaignId, status: CampaignStatus) -> Result<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
            campaign.status = status.to_string();
            let now = Utc::now();
            if status == CampaignStatus::Running {
                campaign.started_at = Some(now);
            }
            if matches!(status, CampaignStatus::Completed | CampaignStatus::Cancelled) {
                campaign.completed_at = Some(now);
            }
            campaign.updated_at = now;
        }
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
        let mut campaigns = self.campaigns.lock().unwrap();
        if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
            campaign.sent_count = sent;
            campaign.delivered_count = delivered;
            campaign.failed_count = failed;
            campaign.status = status.to_string();
            campaign.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl DialogRepositoryTrait for MemoryStore {
    async fn append_message(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
        contact_phone: &str,
        contact_name: Option<&str>,
        entry: &MessageEntry,
    ) -> Result<()> {
        let entry_json = serde_json::to_value(entry)
            .map_err(|e| telereach_common::Error::Internal(e.to_string()))?;
        let inbound = matches!(
            entry.direction,
            telereach_common::types::MessageDirection::Incoming
        );
        let mut dialogs = self.dialogs.lock().unwrap();
        match dialogs.iter_mut().find(|d| d.contact_id == contact_id) {
            Some(dialog) => {
                let mut messages = dialog.messages_vec();
                messages.push(entry.clone());
                dialog.messages = serde_json::to_value(messages)
                    .map_err(|e| telereach_common::Error::Internal(e.to_string()))?;
                if entry.account_id.is_some() {
                    dialog.account_id = entry.account_id;
                    dialog.account_phone = entry.account_phone.clone();
                }
                dialog.has_response = dialog.has_response || inbound;
                dialog.last_message_at = Some(entry.sent_at);
                dialog.updated_at = Utc::now();
            }
            None => {
                let now = Utc::now();
                dialogs.push(Dialog {
                    id: Uuid::new_v4(),
                    tenant_id,
                    contact_id,
                    contact_phone: contact_phone.to_string(),
                    contact_name: contact_name.map(|n| n.to_string()),
                    account_id: entry.account_id,
                    account_phone: entry.account_phone.clone(),
                    messages: serde_json::json!([entry_json]),
                    has_response: inbound,
                    last_message_at: Some(entry.sent_at),
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        Ok(())
    }

    async fn get_by_contact(
        &self,
        tenant_id: TenantId,
        contact_id: ContactId,
    ) -> Result<Option<Dialog>> {
        let dialogs = self.dialogs.lock().unwrap();
        Ok(dialogs
            .iter()
            .find(|d| d.tenant_id == tenant_id && d.contact_id == contact_id)
            .cloned())
    }
}

#[async_trait]
impl FollowUpRepositoryTrait for MemoryStore {
    async fn insert(&self, item: &FollowUpItem) -> Result<()> {
        self.followups.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn has_pending(&self, tenant_id: TenantId, contact_id: ContactId) -> Result<bool> {
        let followups = self.followups.lock().unwrap();
        Ok(followups.iter().any(|i| {
            i.tenant_id == tenant_id && i.contact_id == contact_id && i.status == "pending"
        }))
    }

    async fn list_pending(&self, tenant_id: TenantId) -> Result<Vec<FollowUpItem>> {
        let followups = self.followups.lock().unwrap();
        let mut out: Vec<FollowUpItem> = followups
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.status == "pending")
            .cloned()
            .collect();
        out.sort_by_key(|i| i.scheduled_at);
        Ok(out)
    }

    async fn list_due(&self, tenant_id: TenantId, now: Timestamp) -> Result<Vec<FollowUpItem>> {
        let followups = self.followups.lock().unwrap();
        let mut out: Vec<FollowUpItem> = followups
            .iter()
            .filter(|i| {
                i.tenant_id == tenant_id && i.status == "pending" && i.scheduled_at <= now
            })
            .cloned()
            .collect();
        out.sort_by_key(|i| i.scheduled_at);
        Ok(out)
    }

    async fn mark_sent(&self, id: FollowUpItemId, now: Timestamp) -> Result<()> {
        let mut followups = self.followups.lock().unwrap();
        if let Some(item) = followups.iter_mut().find(|i| i.id == id) {
            item.status = "sent".to_string();
            item.completed_at = Some(now);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: FollowUpItemId, error: &str, now: Timestamp) -> Result<()> {
        let mut followups = self.followups.lock().unwrap();
        if let Some(item) = followups.iter_mut().find(|i| i.id == id) {
            item.status = "failed".to_string();
            item.last_error = Some(error.to_string());
            item.completed_at = Some(now);
        }
        Ok(())
    }

    async fn cancel_pending(&self, tenant_id: TenantId, id: FollowUpItemId) -> Result<bool> {
        let mut followups = self.followups.lock().unwrap();
        if let Some(item) = followups
            .iter_mut()
            .find(|i| i.tenant_id == tenant_id && i.id == id && i.status == "pending")
        {
            item.status = "cancelled".to_string();
            item.completed_at = Some(Utc::now());
            return Ok(true);
        }
        Ok(false)
    }

    async fn count_by_status(&self, tenant_id: TenantId, status: FollowUpStatus) -> Result<i64> {
        let status = status.to_string();
        let followups = self.followups.lock().unwrap();
        Ok(followups
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.status == status)
            .count() as i64)
    }
}

#[async_trait]
impl VoiceMessageRepositoryTrait for MemoryStore {
    async fn get(&self, tenant_id: TenantId, id: VoiceMessageId) -> Result<Option<VoiceMessage>> {
        let voices = self.voice_messages.lock().unwrap();
        Ok(voices
            .iter()
            .find(|v| v.tenant_id == tenant_id && v.id == id)
            .cloned())
    }

    async fn increment_sent(&self, id: VoiceMessageId) -> Result<()> {
        let mut voices = self.voice_messages.lock().unwrap();
        if let Some(voice) = voices.iter_mut().find(|v| v.id == id) {
            voice.sent_count += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock gateway

/// One recorded gateway invocation
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub kind: &'static str,
    pub account_phone: String,
    pub recipient_phone: String,
    pub payload: String,
    pub proxy: Option<ProxyConfig>,
}

/// Gateway double that replays scripted outcomes in call order
///
/// With no script queued every send succeeds with a fresh message id. An
/// optional trip wire cancels a token after the n-th call, which makes
/// mid-run cancellation deterministic.
#[derive(Default)]
pub struct MockGateway {
    outcomes: Mutex<VecDeque<SendOutcome>>,
    pub calls: Mutex<Vec<GatewayCall>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    next_message_id: AtomicI64,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_message_id: AtomicI64::new(1000),
            ..Self::default()
        })
    }

    pub fn script(&self, outcome: SendOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn script_sent(&self) {
        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        self.script(SendOutcome::Sent {
            remote_message_id: id,
            timestamp: Utc::now(),
        });
    }

    /// Trip the token once `calls` reaches `after` invocations
    pub fn cancel_token_after(&self, after: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((after, token));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call(&self, index: usize) -> GatewayCall {
        self.calls.lock().unwrap()[index].clone()
    }

    fn record(
        &self,
        kind: &'static str,
        credential: &AccountCredential,
        proxy: Option<&ProxyConfig>,
        recipient_phone: &str,
        payload: &str,
    ) -> SendOutcome {
        let mut calls = self.calls.lock().unwrap();
        calls.push(GatewayCall {
            kind,
            account_phone: credential.phone.clone(),
            recipient_phone: recipient_phone.to_string(),
            payload: payload.to_string(),
            proxy: proxy.cloned(),
        });
        let count = calls.len();
        drop(calls);

        if let Some((after, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if count >= *after {
                token.cancel();
            }
        }

        self.outcomes.lock().unwrap().pop_front().unwrap_or_else(|| {
            let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
            SendOutcome::Sent {
                remote_message_id: id,
                timestamp: Utc::now(),
            }
        })
    }
}

#[async_trait]
impl DeliveryGateway for MockGateway {
    async fn send_text(
        &self,
        credential: &AccountCredential,
        proxy: Option<&ProxyConfig>,
        recipient_phone: &str,
        text: &str,
    ) -> Result<SendOutcome> {
        Ok(self.record("text", credential, proxy, recipient_phone, text))
    }

    async fn send_voice(
        &self,
        credential: &AccountCredential,
        proxy: Option<&ProxyConfig>,
        recipient_phone: &str,
        asset_path: &str,
    ) -> Result<SendOutcome> {
        Ok(self.record("voice", credential, proxy, recipient_phone, asset_path))
    }
}

// ---------------------------------------------------------------------------
// Wiring

pub fn build_service(
    store: &Arc<MemoryStore>,
    gateway: &Arc<MockGateway>,
    leases: &Arc<AccountLeaseRegistry>,
) -> CampaignService {
    let executor = CampaignExecutor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        gateway.clone(),
        leases.clone(),
        EngineConfig::default(),
    );
    CampaignService::new(store.clone(), executor)
}

pub fn build_executor(
    store: &Arc<MemoryStore>,
    gateway: &Arc<MockGateway>,
    leases: &Arc<AccountLeaseRegistry>,
) -> CampaignExecutor {
    CampaignExecutor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        gateway.clone(),
        leases.clone(),
        EngineConfig::default(),
    )
}

pub fn build_followup_manager(
    store: &Arc<MemoryStore>,
    gateway: &Arc<MockGateway>,
    config: FollowUpConfig,
) -> FollowUpManager {
    FollowUpManager::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        gateway.clone(),
        config,
        &EngineConfig::default(),
    )
}

/// Bucket a value the way the engine does, handy for seeding categories
pub fn value_for(category: AccountCategory) -> f64 {
    match category {
        AccountCategory::Low => 120.0,
        AccountCategory::Medium => 350.0,
        AccountCategory::High => 800.0,
    }
}

//! Follow-up queue management and drain processing

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use telereach_common::config::{EngineConfig, FollowUpConfig};
use telereach_common::types::{
    AccountSelection, ContactStatus, FollowUpItemId, FollowUpStatus, MessageDirection,
    MessageKind, TenantId, VoiceMessageId,
};
use telereach_storage::models::{Account, EntryStatus, FollowUpItem, MessageEntry};
use telereach_storage::{
    AccountRepositoryTrait, ContactRepositoryTrait, DialogRepositoryTrait, FollowUpRepositoryTrait,
    VoiceMessageRepositoryTrait,
};

use crate::campaign::SendFailure;
use crate::gateway::{AccountCredential, DeliveryGateway, SendOutcome};

/// Follow-up queue errors
#[derive(Error, Debug)]
pub enum FollowUpError {
    #[error("Voice message not found or inactive")]
    VoiceNotFound,

    #[error("No authorized account available for follow-ups")]
    NoSendAccount,

    #[error("Follow-up item not found or not pending")]
    NotPending,

    #[error("Storage error: {0}")]
    Storage(#[from] telereach_common::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result of scanning read contacts into the queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnqueueSummary {
    pub added: u32,
    pub already_in_queue: u32,
    pub total_read_contacts: u32,
}

/// Result of one queue drain
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrainSummary {
    pub processed: u32,
    pub sent: u32,
    pub failed: u32,
    pub errors: Vec<SendFailure>,
}

impl DrainSummary {
    fn push_error(&mut self, contact_phone: &str, error: &str, cap: usize) {
        if self.errors.len() < cap {
            self.errors.push(SendFailure {
                contact_phone: contact_phone.to_string(),
                error: error.to_string(),
            });
        }
    }
}

/// Queue counts by status plus the current read-contact backlog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FollowUpStats {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
    pub cancelled: i64,
    pub read_contacts: i64,
}

/// Schedules and delivers voice follow-ups
///
/// Contacts who read an outreach message without replying get one delayed
/// voice message. Enqueueing and draining are separate external triggers;
/// nothing here runs on a timer.
pub struct FollowUpManager {
    followups: Arc<dyn FollowUpRepositoryTrait>,
    voice_messages: Arc<dyn VoiceMessageRepositoryTrait>,
    contacts: Arc<dyn ContactRepositoryTrait>,
    accounts: Arc<dyn AccountRepositoryTrait>,
    dialogs: Arc<dyn DialogRepositoryTrait>,
    gateway: Arc<dyn DeliveryGateway>,
    config: FollowUpConfig,
    max_error_reports: usize,
}

impl FollowUpManager {
    /// Create a manager over the given stores and gateway
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        followups: Arc<dyn FollowUpRepositoryTrait>,
        voice_messages: Arc<dyn VoiceMessageRepositoryTrait>,
        contacts: Arc<dyn ContactRepositoryTrait>,
        accounts: Arc<dyn AccountRepositoryTrait>,
        dialogs: Arc<dyn DialogRepositoryTrait>,
        gateway: Arc<dyn DeliveryGateway>,
        config: FollowUpConfig,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            followups,
            voice_messages,
            contacts,
            accounts,
            dialogs,
            gateway,
            config,
            max_error_reports: engine.max_error_reports,
        }
    }

    /// Queue a voice follow-up for every read contact not already queued
    ///
    /// Contacts with a pending item keep it; the voice message on the
    /// existing item wins. Each new item is scheduled `delay_minutes` from
    /// now.
    pub async fn enqueue(
        &self,
        tenant_id: TenantId,
        voice_message_id: VoiceMessageId,
    ) -> Result<EnqueueSummary, FollowUpError> {
        let voice = self
            .voice_messages
            .get(tenant_id, voice_message_id)
            .await?
            .filter(|v| v.is_active)
            .ok_or(FollowUpError::VoiceNotFound)?;

        let read_contacts = self
            .contacts
            .list_by_status(tenant_id, ContactStatus::Read)
            .await?;
        let now = Utc::now();

        let mut summary = EnqueueSummary {
            total_read_contacts: read_contacts.len() as u32,
            ..Default::default()
        };
        for contact in read_contacts {
            if self.followups.has_pending(tenant_id, contact.id).await? {
                summary.already_in_queue += 1;
                continue;
            }
            let item = FollowUpItem {
                id: Uuid::now_v7(),
                tenant_id,
                contact_id: contact.id,
                contact_phone: contact.phone.clone(),
                contact_name: contact.name.clone(),
                voice_message_id: voice.id,
                voice_message_name: voice.name.clone(),
                status: FollowUpStatus::Pending.to_string(),
                read_at: contact.read_at.unwrap_or(now),
                scheduled_at: now + chrono::Duration::minutes(i64::from(voice.delay_minutes)),
                completed_at: None,
                last_error: None,
                created_at: now,
            };
            self.followups.insert(&item).await?;
            summary.added += 1;
        }

        info!(
            "Voice follow-up {}: queued {} of {} read contacts ({} already queued)",
            voice.name, summary.added, summary.total_read_contacts, summary.already_in_queue
        );
        Ok(summary)
    }

    /// Deliver queued follow-ups through one account
    ///
    /// Sweeps every pending item, or only the due ones when the schedule is
    /// enforced. Item failures are terminal and folded into the summary;
    /// the drain itself only fails when storage does or when no account is
    /// available before the first item.
    pub async fn drain(&self, tenant_id: TenantId) -> Result<DrainSummary, FollowUpError> {
        let now = Utc::now();
        let items = if self.config.enforce_schedule {
            self.followups.list_due(tenant_id, now).await?
        } else {
            self.followups.list_pending(tenant_id).await?
        };

        let mut summary = DrainSummary::default();
        if items.is_empty() {
            debug!("Follow-up queue for tenant {} is empty", tenant_id);
            return Ok(summary);
        }

        let mut pool = self.load_send_accounts(tenant_id).await?;
        let Some((mut account, mut credential)) = pool.pop_front() else {
            return Err(FollowUpError::NoSendAccount);
        };

        info!(
            "Draining {} follow-up items for tenant {} via account {}",
            items.len(),
            tenant_id,
            account.phone
        );

        let total = items.len();
        for (index, item) in items.iter().enumerate() {
            summary.processed += 1;

            let voice = self
                .voice_messages
                .get(tenant_id, item.voice_message_id)
                .await?;
            let Some(voice) = voice else {
                let error = format!("Voice message {} no longer exists", item.voice_message_name);
                warn!("Follow-up {} failed: {}", item.id, error);
                self.followups.mark_failed(item.id, &error, now).await?;
                summary.failed += 1;
                summary.push_error(&item.contact_phone, &error, self.max_error_reports);
                continue;
            };

            let proxy = account.proxy_config();
            let outcome = self
                .gateway
                .send_voice(&credential, proxy.as_ref(), &item.contact_phone, &voice.path)
                .await
                .unwrap_or_else(|e| SendOutcome::Recoverable {
                    reason: e.to_string(),
                    retry_after_seconds: None,
                });

            match outcome {
                SendOutcome::Sent {
                    remote_message_id,
                    timestamp,
                } => {
                    self.followups.mark_sent(item.id, timestamp).await?;
                    self.contacts.mark_voice_sent(item.contact_id).await?;
                    self.voice_messages.increment_sent(voice.id).await?;
                    let entry = MessageEntry {
                        id: Uuid::now_v7(),
                        direction: MessageDirection::Outgoing,
                        kind: MessageKind::Voice,
                        text: format!("Voice message: {}", voice.name),
                        status: EntryStatus::Delivered,
                        error: None,
                        remote_message_id: Some(remote_message_id),
                        account_id: Some(account.id),
                        account_phone: Some(account.phone.clone()),
                        account_category: Some(account.category()),
                        sent_at: timestamp,
                    };
                    self.dialogs
                        .append_message(
                            tenant_id,
                            item.contact_id,
                            &item.contact_phone,
                            item.contact_name.as_deref(),
                            &entry,
                        )
                        .await?;
                    self.accounts.record_send(account.id, true, timestamp).await?;
                    summary.sent += 1;
                    debug!("Voice follow-up sent to {}", item.contact_phone);
                }
                SendOutcome::Recoverable { reason, .. } => {
                    warn!(
                        "Voice follow-up to {} failed: {}",
                        item.contact_phone, reason
                    );
                    self.followups.mark_failed(item.id, &reason, now).await?;
                    self.accounts.record_send(account.id, false, now).await?;
                    summary.failed += 1;
                    summary.push_error(&item.contact_phone, &reason, self.max_error_reports);
                }
                SendOutcome::Fatal { kind, reason } => {
                    let status = kind.account_status();
                    warn!(
                        "Account {} is {} during drain: {}",
                        account.phone, status, reason
                    );
                    self.followups.mark_failed(item.id, &reason, now).await?;
                    self.accounts.set_status(account.id, status).await?;
                    self.accounts.record_send(account.id, false, now).await?;
                    summary.failed += 1;
                    summary.push_error(&item.contact_phone, &reason, self.max_error_reports);

                    match pool.pop_front() {
                        Some(next) => {
                            info!("Drain continues via account {}", next.0.phone);
                            account = next.0;
                            credential = next.1;
                        }
                        None => {
                            let left = total - index - 1;
                            if left > 0 {
                                warn!(
                                    "No usable account remains; {} follow-up items stay pending",
                                    left
                                );
                                summary.push_error(
                                    &item.contact_phone,
                                    "account pool exhausted, remaining items left pending",
                                    self.max_error_reports,
                                );
                            }
                            break;
                        }
                    }
                }
            }

            let last = index + 1 == total;
            if !last {
                tokio::time::sleep(Duration::from_secs(self.config.send_gap_secs)).await;
            }
        }

        info!(
            "Follow-up drain finished: processed={} sent={} failed={}",
            summary.processed, summary.sent, summary.failed
        );
        Ok(summary)
    }

    /// Cancel a pending follow-up item
    ///
    /// Items already sent, failed, or cancelled reject the transition.
    pub async fn cancel(
        &self,
        tenant_id: TenantId,
        item_id: FollowUpItemId,
    ) -> Result<(), FollowUpError> {
        if self.followups.cancel_pending(tenant_id, item_id).await? {
            info!("Follow-up {} cancelled", item_id);
            Ok(())
        } else {
            Err(FollowUpError::NotPending)
        }
    }

    /// Queue counts plus the size of the read-contact backlog
    pub async fn stats(&self, tenant_id: TenantId) -> Result<FollowUpStats, FollowUpError> {
        Ok(FollowUpStats {
            pending: self
                .followups
                .count_by_status(tenant_id, FollowUpStatus::Pending)
                .await?,
            sent: self
                .followups
                .count_by_status(tenant_id, FollowUpStatus::Sent)
                .await?,
            failed: self
                .followups
                .count_by_status(tenant_id, FollowUpStatus::Failed)
                .await?,
            cancelled: self
                .followups
                .count_by_status(tenant_id, FollowUpStatus::Cancelled)
                .await?,
            read_contacts: self
                .contacts
                .count_by_status(tenant_id, ContactStatus::Read)
                .await?,
        })
    }

    /// Authorized accounts paired with their credentials, in creation order
    ///
    /// Follow-ups use one account at a time; the rest of the list only
    /// matters when the current account dies mid-drain.
    async fn load_send_accounts(
        &self,
        tenant_id: TenantId,
    ) -> Result<VecDeque<(Account, AccountCredential)>, FollowUpError> {
        let accounts = self
            .accounts
            .list_for_selection(tenant_id, &AccountSelection::All)
            .await?;
        Ok(accounts
            .into_iter()
            .filter(|a| a.is_authorized())
            .filter_map(|a| AccountCredential::from_account(&a).map(|c| (a, c)))
            .collect())
    }
}

//! Campaign execution - the contact-by-contact send loop

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use telereach_common::config::EngineConfig;
use telereach_common::types::{AccountCategory, AccountId, MessageDirection, MessageKind, RunId};
use telereach_storage::models::{Account, Campaign, EntryStatus, MessageEntry};
use telereach_storage::{AccountRepositoryTrait, ContactRepositoryTrait, DialogRepositoryTrait};

use super::leases::{AccountLease, AccountLeaseRegistry};
use super::limiter;
use super::selector::{AccountSelector, SelectionMode};
use super::service::CampaignError;
use super::template::TemplateRenderer;
use crate::gateway::{AccountCredential, DeliveryGateway, SendOutcome};

/// Summary of one campaign run
///
/// `sent` counts delivery attempts; `delivered` counts the ones the gateway
/// confirmed. Errors hold only the first few failures, the full story lives
/// in the dialog records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    pub sent: u32,
    pub delivered: u32,
    pub failed: u32,
    pub skipped_due_to_limits: u32,
    pub accounts_used: u32,
    pub by_category: BTreeMap<AccountCategory, u32>,
    pub errors: Vec<SendFailure>,
    pub cancelled: bool,
}

/// One reported delivery failure
#[derive(Debug, Clone, Serialize)]
pub struct SendFailure {
    pub contact_phone: String,
    pub error: String,
}

impl RunResult {
    fn push_error(&mut self, contact_phone: &str, error: &str, cap: usize) {
        if self.errors.len() < cap {
            self.errors.push(SendFailure {
                contact_phone: contact_phone.to_string(),
                error: error.to_string(),
            });
        }
    }
}

/// Runs campaigns contact by contact
///
/// The executor owns no campaign state of its own; it reads the pools from
/// storage, drives the selector and gateway, and folds every per-contact
/// outcome into the run summary. Only run-level failures surface as errors.
pub struct CampaignExecutor {
    accounts: Arc<dyn AccountRepositoryTrait>,
    contacts: Arc<dyn ContactRepositoryTrait>,
    dialogs: Arc<dyn DialogRepositoryTrait>,
    gateway: Arc<dyn DeliveryGateway>,
    leases: Arc<AccountLeaseRegistry>,
    renderer: TemplateRenderer,
    config: EngineConfig,
}

impl CampaignExecutor {
    /// Create an executor over the given stores and gateway
    pub fn new(
        accounts: Arc<dyn AccountRepositoryTrait>,
        contacts: Arc<dyn ContactRepositoryTrait>,
        dialogs: Arc<dyn DialogRepositoryTrait>,
        gateway: Arc<dyn DeliveryGateway>,
        leases: Arc<AccountLeaseRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            accounts,
            contacts,
            dialogs,
            gateway,
            leases,
            renderer: TemplateRenderer::new(&config),
            config,
        }
    }

    /// Execute one full run of a campaign
    ///
    /// Fails before the first send when no contacts match or no account can
    /// be leased; per-contact failures after that point are folded into the
    /// result instead. The cancel token is polled between contacts, so an
    /// in-progress send always completes and persists before the run stops.
    pub async fn execute(
        &self,
        campaign: &Campaign,
        cancel: CancellationToken,
    ) -> Result<RunResult, CampaignError> {
        let run_id: RunId = Uuid::now_v7();

        let contacts = self
            .contacts
            .list_for_selection(campaign.tenant_id, &campaign.contact_selection())
            .await?;
        if contacts.is_empty() {
            return Err(CampaignError::NoContacts);
        }

        let (pool, _leases) = self.build_account_pool(campaign, run_id).await?;
        if pool.is_empty() {
            return Err(CampaignError::NoAccounts);
        }

        let mode = if campaign.use_rotation {
            SelectionMode::Rotation
        } else {
            SelectionMode::Static
        };
        let mut selector = AccountSelector::new(pool, mode, campaign.respect_limits);

        info!(
            "Campaign {} run {} started: {} contacts, {} accounts",
            campaign.id,
            run_id,
            contacts.len(),
            selector.len()
        );

        let mut result = RunResult::default();
        let mut used: HashSet<AccountId> = HashSet::new();
        let total = contacts.len();

        for (index, contact) in contacts.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    "Campaign {} run cancelled after {} attempts",
                    campaign.id, result.sent
                );
                result.cancelled = true;
                break;
            }

            let now = Utc::now();
            let Some(account) = selector.select(now) else {
                if selector.is_empty() {
                    // Every account died mid-run; partial results stand.
                    warn!(
                        "Campaign {}: no usable accounts remain, stopping early",
                        campaign.id
                    );
                    break;
                }
                if mode == SelectionMode::Static {
                    // A full cycle found nobody; nothing frees up mid-run
                    // in static mode, so stop instead of burning the list.
                    warn!(
                        "Campaign {}: account pool exhausted in static order, stopping early",
                        campaign.id
                    );
                    break;
                }
                result.skipped_due_to_limits += 1;
                debug!(
                    "No eligible account for contact {}, skipping",
                    contact.phone
                );
                continue;
            };
            let Some(credential) = AccountCredential::from_account(&account) else {
                selector.remove(account.id);
                continue;
            };

            let text = self.renderer.render(&campaign.message_template, contact);
            let proxy = account.proxy_config();

            result.sent += 1;
            used.insert(account.id);
            *result.by_category.entry(account.category()).or_insert(0) += 1;

            let outcome = self
                .gateway
                .send_text(&credential, proxy.as_ref(), &contact.phone, &text)
                .await
                .unwrap_or_else(|e| SendOutcome::Recoverable {
                    reason: e.to_string(),
                    retry_after_seconds: None,
                });
            selector.record_attempt(account.id);

            match outcome {
                SendOutcome::Sent {
                    remote_message_id,
                    timestamp,
                } => {
                    result.delivered += 1;
                    let entry = MessageEntry {
                        id: Uuid::now_v7(),
                        direction: MessageDirection::Outgoing,
                        kind: MessageKind::Text,
                        text: text.clone(),
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
                            campaign.tenant_id,
                            contact.id,
                            &contact.phone,
                            contact.name.as_deref(),
                            &entry,
                        )
                        .await?;
                    self.contacts.mark_messaged(contact.id, timestamp).await?;
                    self.accounts.record_send(account.id, true, timestamp).await?;
                    debug!("Sent to {} via {}", contact.phone, account.phone);
                }
                SendOutcome::Recoverable {
                    reason,
                    retry_after_seconds,
                } => {
                    result.failed += 1;
                    result.push_error(&contact.phone, &reason, self.config.max_error_reports);
                    let entry = MessageEntry {
                        id: Uuid::now_v7(),
                        direction: MessageDirection::Outgoing,
                        kind: MessageKind::Text,
                        text: text.clone(),
                        status: EntryStatus::Failed,
                        error: Some(reason.clone()),
                        remote_message_id: None,
                        account_id: Some(account.id),
                        account_phone: Some(account.phone.clone()),
                        account_category: Some(account.category()),
                        sent_at: now,
                    };
                    self.dialogs
                        .append_message(
                            campaign.tenant_id,
                            contact.id,
                            &contact.phone,
                            contact.name.as_deref(),
                            &entry,
                        )
                        .await?;
                    // The attempt still burns a rate-limit slot
                    self.accounts.record_send(account.id, false, now).await?;
                    if let Some(seconds) = retry_after_seconds {
                        warn!(
                            "Account {} flood-limited for {}s: {}",
                            account.phone, seconds, reason
                        );
                        selector.pause_until(
                            account.id,
                            now + chrono::Duration::seconds(seconds as i64),
                        );
                    } else {
                        warn!("Send to {} failed: {}", contact.phone, reason);
                    }
                }
                SendOutcome::Fatal { kind, reason } => {
                    result.failed += 1;
                    result.push_error(&contact.phone, &reason, self.config.max_error_reports);
                    let status = kind.account_status();
                    warn!(
                        "Account {} is {} and leaves the run: {}",
                        account.phone, status, reason
                    );
                    self.accounts.set_status(account.id, status).await?;
                    self.accounts.record_send(account.id, false, now).await?;
                    selector.remove(account.id);
                }
            }

            let last = index + 1 == total;
            if !last && !cancel.is_cancelled() {
                let delay =
                    send_delay(account.delay_min_seconds, account.delay_max_seconds);
                debug!("Waiting {:?} before the next contact", delay);
                tokio::time::sleep(delay).await;
            }
        }

        result.accounts_used = used.len() as u32;
        info!(
            "Campaign {} run {} finished: sent={} delivered={} failed={} skipped={}",
            campaign.id,
            run_id,
            result.sent,
            result.delivered,
            result.failed,
            result.skipped_due_to_limits
        );
        Ok(result)
    }

    /// Fetch, refresh, and lease the campaign's account pool
    ///
    /// Window resets found here persist immediately; they are calendar
    /// bookkeeping, not run progress, so they survive a rolled-back run.
    async fn build_account_pool(
        &self,
        campaign: &Campaign,
        run_id: RunId,
    ) -> Result<(Vec<Account>, Vec<AccountLease>), CampaignError> {
        let now = Utc::now();
        let mut candidates = self
            .accounts
            .list_for_selection(campaign.tenant_id, &campaign.account_selection())
            .await?;

        for account in candidates.iter_mut() {
            let refresh = limiter::refresh_windows(account, now);
            if refresh.any() {
                self.accounts
                    .reset_windows(account.id, refresh.hour_reset, refresh.day_reset, now)
                    .await?;
            }
        }

        let mut pool = Vec::new();
        let mut leases = Vec::new();
        for account in candidates {
            if !account.is_authorized() {
                continue;
            }
            match self.leases.try_acquire(account.id, run_id) {
                Some(lease) => {
                    leases.push(lease);
                    pool.push(account);
                }
                None => {
                    debug!(
                        "Account {} is leased by another run, excluded",
                        account.phone
                    );
                }
            }
        }
        Ok((pool, leases))
    }
}

/// Uniform inter-send delay from the sending account's configured range
fn send_delay(min_seconds: i32, max_seconds: i32) -> Duration {
    let min = min_seconds.max(0) as u64;
    let max = (max_seconds.max(min_seconds).max(0)) as u64;
    if max == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(rand::thread_rng().gen_range(min..=max))
}

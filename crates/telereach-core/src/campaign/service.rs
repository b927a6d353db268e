//! Campaign Service - lifecycle transitions and run orchestration

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use telereach_common::types::{CampaignId, CampaignStatus, TenantId};
use telereach_storage::CampaignRepositoryTrait;

use super::executor::{CampaignExecutor, RunResult};

/// Campaign lifecycle and run errors
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign not found")]
    NotFound,

    #[error("Campaign is already running")]
    AlreadyRunning,

    #[error("Campaign has no active run")]
    NotRunning,

    #[error("No contacts match the campaign filter")]
    NoContacts,

    #[error("No eligible accounts available")]
    NoAccounts,

    #[error("Storage error: {0}")]
    Storage(#[from] telereach_common::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Handle to a spawned campaign run
pub struct RunHandle {
    campaign_id: CampaignId,
    handle: JoinHandle<Result<RunResult, CampaignError>>,
}

impl RunHandle {
    /// Campaign this run belongs to
    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    /// Wait for the run to finish and take its result
    pub async fn wait(self) -> Result<RunResult, CampaignError> {
        self.handle
            .await
            .map_err(|e| CampaignError::Internal(anyhow::anyhow!("run task failed: {}", e)))?
    }
}

type RunRegistry = Arc<Mutex<HashMap<CampaignId, CancellationToken>>>;

/// Starts, tracks, and cancels campaign runs
///
/// One run per campaign at a time; the registry of live cancel tokens,
/// not the status column, is the authority on what is currently running.
pub struct CampaignService {
    campaigns: Arc<dyn CampaignRepositoryTrait>,
    executor: Arc<CampaignExecutor>,
    runs: RunRegistry,
}

impl CampaignService {
    /// Create a service over the campaign store and executor
    pub fn new(campaigns: Arc<dyn CampaignRepositoryTrait>, executor: CampaignExecutor) -> Self {
        Self {
            campaigns,
            executor: Arc::new(executor),
            runs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a campaign run in the background
    ///
    /// The campaign moves to `running` before the first send. A run that
    /// finds no work reverts it to `draft` with nothing persisted; a run
    /// that sends anything lands on `completed` or `cancelled` with its
    /// counters recorded.
    pub async fn start(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<RunHandle, CampaignError> {
        let campaign = self
            .campaigns
            .get(tenant_id, campaign_id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        if campaign.status_enum() == Some(CampaignStatus::Running) {
            return Err(CampaignError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        {
            let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
            if runs.contains_key(&campaign_id) {
                return Err(CampaignError::AlreadyRunning);
            }
            runs.insert(campaign_id, token.clone());
        }

        if let Err(e) = self
            .campaigns
            .update_status(campaign_id, CampaignStatus::Running)
            .await
        {
            self.deregister(campaign_id);
            return Err(e.into());
        }
        info!("Campaign {} started", campaign_id);

        let campaigns = Arc::clone(&self.campaigns);
        let executor = Arc::clone(&self.executor);
        let runs = Arc::clone(&self.runs);
        let handle = tokio::spawn(async move {
            let outcome = executor.execute(&campaign, token).await;
            let settled = match outcome {
                Ok(result) => {
                    let status = if result.cancelled {
                        CampaignStatus::Cancelled
                    } else {
                        CampaignStatus::Completed
                    };
                    if let Err(e) = campaigns
                        .record_run(
                            campaign.id,
                            result.sent as i32,
                            result.delivered as i32,
                            result.failed as i32,
                            status,
                        )
                        .await
                    {
                        error!(
                            "Campaign {} finished but its run could not be recorded: {}",
                            campaign.id, e
                        );
                    }
                    info!(
                        "Campaign {} {}: sent={} delivered={} failed={}",
                        campaign.id, status, result.sent, result.delivered, result.failed
                    );
                    Ok(result)
                }
                Err(e) => {
                    warn!("Campaign {} run failed, reverting to draft: {}", campaign.id, e);
                    if let Err(revert) = campaigns
                        .update_status(campaign.id, CampaignStatus::Draft)
                        .await
                    {
                        error!(
                            "Campaign {} could not be reverted to draft: {}",
                            campaign.id, revert
                        );
                    }
                    Err(e)
                }
            };
            runs.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&campaign.id);
            settled
        });

        Ok(RunHandle {
            campaign_id,
            handle,
        })
    }

    /// Ask a running campaign to stop
    ///
    /// The run notices between contacts, so the current send still lands
    /// before the campaign settles as `cancelled`.
    pub fn cancel(&self, campaign_id: CampaignId) -> Result<(), CampaignError> {
        let runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        match runs.get(&campaign_id) {
            Some(token) => {
                info!("Campaign {} cancellation requested", campaign_id);
                token.cancel();
                Ok(())
            }
            None => Err(CampaignError::NotRunning),
        }
    }

    /// Whether a run is currently live for the campaign
    pub fn is_running(&self, campaign_id: CampaignId) -> bool {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&campaign_id)
    }

    fn deregister(&self, campaign_id: CampaignId) {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&campaign_id);
    }
}

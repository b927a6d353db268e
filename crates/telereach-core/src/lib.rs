//! Telereach Core - outreach engine and follow-up delivery
//!
//! This crate provides the core outreach functionality for Telereach,
//! including account selection, rate limiting, template rendering,
//! campaign execution, and the follow-up voice queue.

pub mod campaign;
pub mod followup;
pub mod gateway;

pub use campaign::{
    AccountLease, AccountLeaseRegistry, AccountSelector, CampaignError, CampaignExecutor,
    CampaignService, RunHandle, RunResult, SendFailure, SelectionMode, TemplateRenderer,
};
pub use followup::{DrainSummary, EnqueueSummary, FollowUpError, FollowUpManager, FollowUpStats};
pub use gateway::{
    AccountCredential, DeliveryGateway, FatalKind, SendOutcome, SessionCache,
};

//! Campaign Module - account selection, rate limiting, and outreach execution

mod executor;
mod leases;
mod limiter;
mod selector;
mod service;
mod template;

pub use executor::{CampaignExecutor, RunResult, SendFailure};
pub use leases::{AccountLease, AccountLeaseRegistry};
pub use limiter::{can_send, hourly_headroom, refresh_windows, CounterRefresh};
pub use selector::{AccountSelector, SelectionMode};
pub use service::{CampaignError, CampaignService, RunHandle};
pub use template::TemplateRenderer;

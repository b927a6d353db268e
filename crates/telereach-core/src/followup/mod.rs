//! Follow-up Module - delayed voice messages for read-but-silent contacts

mod manager;

pub use manager::{DrainSummary, EnqueueSummary, FollowUpError, FollowUpManager, FollowUpStats};

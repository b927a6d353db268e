//! Repository layer for data access

pub mod accounts;
pub mod campaigns;
pub mod contacts;
pub mod dialogs;
pub mod followups;
pub mod voice_messages;

// Re-export concrete repository implementations with simple names
pub use accounts::DbAccountRepository as AccountRepository;
pub use campaigns::DbCampaignRepository as CampaignRepository;
pub use contacts::DbContactRepository as ContactRepository;
pub use dialogs::DbDialogRepository as DialogRepository;
pub use followups::DbFollowUpRepository as FollowUpRepository;
pub use voice_messages::DbVoiceMessageRepository as VoiceMessageRepository;

// Re-export repository traits
pub use accounts::AccountRepository as AccountRepositoryTrait;
pub use campaigns::CampaignRepository as CampaignRepositoryTrait;
pub use contacts::ContactRepository as ContactRepositoryTrait;
pub use dialogs::DialogRepository as DialogRepositoryTrait;
pub use followups::FollowUpRepository as FollowUpRepositoryTrait;
pub use voice_messages::VoiceMessageRepository as VoiceMessageRepositoryTrait;

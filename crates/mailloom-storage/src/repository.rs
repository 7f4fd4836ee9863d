//! Repository layer for data access

pub mod actions;
pub mod campaigns;
pub mod contacts;
pub mod servers;
pub mod tracking_logs;
pub mod workflows;

pub use actions::ActionRepository;
pub use campaigns::CampaignRepository;
pub use contacts::ContactRepository;
pub use servers::ServerRepository;
pub use tracking_logs::TrackingLogRepository;
pub use workflows::WorkflowRepository;

pub mod client;
pub mod types;

pub use client::{ApiClient, SaveAlertConfigParams};
pub use types::{
    AlertChannels, AlertConfig, ApiEnvelope, KeyMetadata, SettingSnapshot, DEFAULT_COLOR_MAX,
    DEFAULT_COLOR_MIN,
};

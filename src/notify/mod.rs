//! Alert delivery channels. Only the local in-page banner does real work
//! in this crate; SMS and email are observable no-op backends behind the
//! same interface so dispatch accounting stays uniform.

pub mod banner;

pub use banner::{Banner, BannerPhase};

use log::info;

use crate::api::AlertChannels;
use crate::engine::Breach;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Local,
    Sms,
    Email,
}

/// A composed threshold alert, ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotification {
    pub key: String,
    pub name: String,
    pub classification: Breach,
    pub value: f64,
    pub threshold: f64,
}

impl AlertNotification {
    pub fn message(&self) -> String {
        let bound = match self.classification {
            Breach::AboveMax => "maximum",
            Breach::BelowMin => "minimum",
            Breach::None => "bound",
        };
        format!(
            "{}: value {} crossed {} ({})",
            self.name, self.value, bound, self.threshold
        )
    }
}

/// A delivery backend. Implementations must not block; real transports
/// would hand off to their own queue.
pub trait AlertChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;
    fn deliver(&self, notification: &AlertNotification);
}

/// No-op SMS backend; logs what would have been sent.
pub struct SmsChannel;

impl AlertChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn deliver(&self, notification: &AlertNotification) {
        info!("SMS alert would be sent: {}", notification.message());
    }
}

/// No-op email backend; logs what would have been sent.
pub struct EmailChannel;

impl AlertChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn deliver(&self, notification: &AlertNotification) {
        info!("Email alert would be sent: {}", notification.message());
    }
}

/// Marker backend for the in-page banner; the banner transition itself is
/// engine state, driven by the caller after dispatch.
pub struct LocalChannel;

impl AlertChannel for LocalChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Local
    }

    fn deliver(&self, notification: &AlertNotification) {
        info!("local alert: {}", notification.message());
    }
}

/// Fans a notification out to every enabled channel. Returns true when
/// the local channel was among them, so the caller can show the banner.
pub struct Notifier {
    channels: Vec<Box<dyn AlertChannel>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            channels: vec![
                Box::new(LocalChannel),
                Box::new(SmsChannel),
                Box::new(EmailChannel),
            ],
        }
    }

    pub fn dispatch(&self, enabled: &AlertChannels, notification: &AlertNotification) -> bool {
        let mut local_delivered = false;
        for channel in &self.channels {
            let wanted = match channel.kind() {
                ChannelKind::Local => enabled.local,
                ChannelKind::Sms => enabled.sms,
                ChannelKind::Email => enabled.email,
            };
            if wanted {
                channel.deliver(notification);
                if channel.kind() == ChannelKind::Local {
                    local_delivered = true;
                }
            }
        }
        local_delivered
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

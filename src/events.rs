use serde::Serialize;
use tokio::sync::broadcast;

use crate::engine::CardStyle;

/// Everything a display layer needs to mirror engine state. The engine
/// never reads UI state back; these events are a one-way projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum UiEvent {
    CardCreated {
        key: String,
        name: String,
        value: String,
        style: CardStyle,
    },
    CardUpdated {
        key: String,
        value: String,
    },
    CardStyleChanged {
        key: String,
        style: CardStyle,
    },
    CardFlagCleared {
        key: String,
    },
    LastUpdateChanged {
        text: String,
    },
    OrderChanged {
        sequence: Vec<String>,
    },
    SavingOrder {
        active: bool,
    },
    BannerShown {
        message: String,
    },
    BannerClosing,
    BannerHidden,
    StreamConnected,
    StreamDisconnected,
}

/// Broadcast fan-out for UI events. Slow or absent subscribers never block
/// the engine; lagged receivers simply miss events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: UiEvent) {
        // Send fails only when no subscriber exists, which is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_harmless() {
        let bus = EventBus::default();
        bus.emit(UiEvent::BannerHidden);
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(UiEvent::LastUpdateChanged { text: "-".into() });
        match rx.recv().await.unwrap() {
            UiEvent::LastUpdateChanged { text } => assert_eq!(text, "-"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn events_serialize_tagged_camel_case() {
        let json = serde_json::to_string(&UiEvent::SavingOrder { active: true }).unwrap();
        assert_eq!(json, r#"{"type":"savingOrder","active":true}"#);
    }
}

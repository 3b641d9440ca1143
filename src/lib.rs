//! Live PLC settings dashboard engine: streams setting snapshots over
//! SSE, reconciles them into ordered setting cards, evaluates threshold
//! alerts, and persists drag-reorder and alert-config edits back to the
//! server. The [`Monitor`] controller ties it together; rendering is a
//! projection of [`events::UiEvent`]s plus engine reads.

pub mod api;
pub mod config;
pub mod engine;
pub mod events;
pub mod jalali;
pub mod monitor;
pub mod notify;
pub mod stream;

pub use config::MonitorConfig;
pub use engine::{CardStyle, CardViewModel, Engine};
pub use events::{EventBus, UiEvent};
pub use monitor::Monitor;

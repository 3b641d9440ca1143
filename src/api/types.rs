use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_COLOR_MAX: &str = "#ff4444";
pub const DEFAULT_COLOR_MIN: &str = "#ff8800";

/// Standard response envelope used by every dashboard endpoint.
/// A non-"ok" status is an application-level failure even when the
/// HTTP status is 200.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T> {
        if self.status == "ok" {
            self.data
                .ok_or_else(|| anyhow!("server returned ok with no data"))
        } else {
            let message = self
                .message
                .unwrap_or_else(|| format!("server rejected request (status {})", self.status));
            Err(anyhow!(message))
        }
    }

    /// For endpoints whose success response carries no payload.
    pub fn ensure_ok(self) -> Result<()> {
        if self.status == "ok" {
            Ok(())
        } else {
            let message = self
                .message
                .unwrap_or_else(|| format!("server rejected request (status {})", self.status));
            Err(anyhow!(message))
        }
    }
}

/// One entry of the key metadata listing. `fa_name` takes precedence for
/// display, then `name`, then the raw key.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyMetadata {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fa_name: Option<String>,
    #[serde(default)]
    pub order_index: Option<i64>,
}

impl KeyMetadata {
    pub fn display_name(&self) -> &str {
        self.fa_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.key)
    }
}

/// Enabled delivery channels for a key's alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertChannels {
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub email: bool,
}

/// Per-key alert thresholds and styling. Absence of a config for a key
/// disables alerting entirely for that key.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub color_max: Option<String>,
    #[serde(default)]
    pub color_min: Option<String>,
    #[serde(default)]
    pub alert_types: AlertChannels,
}

impl AlertConfig {
    pub fn color_max(&self) -> &str {
        self.color_max
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_COLOR_MAX)
    }

    pub fn color_min(&self) -> &str {
        self.color_min
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_COLOR_MIN)
    }
}

/// One full settings snapshot from the stream. Values arrive as JSON
/// strings or numbers depending on the ingest path; `raw_text` normalizes
/// both. A BTreeMap keeps per-snapshot processing order deterministic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingSnapshot {
    #[serde(rename = "LastUpdate", default)]
    pub last_update: Option<f64>,
    #[serde(default)]
    pub setting: BTreeMap<String, Value>,
}

/// String form of a snapshot value, as the dashboard displays it.
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_ok_yields_data() {
        let env: ApiEnvelope<Vec<i32>> =
            serde_json::from_str(r#"{"status":"ok","data":[1,2]}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn envelope_error_carries_server_message() {
        let env: ApiEnvelope<Vec<i32>> =
            serde_json::from_str(r#"{"status":"error","message":"bad key"}"#).unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.to_string(), "bad key");
    }

    #[test]
    fn envelope_wraps_types_without_default() {
        // AlertConfig implements no Default; absent fields still read as None.
        let env: ApiEnvelope<AlertConfig> =
            serde_json::from_str(r#"{"status":"error","message":"no such key"}"#).unwrap();
        assert!(env.data.is_none());
        assert_eq!(env.into_result().unwrap_err().to_string(), "no such key");

        let env: ApiEnvelope<AlertConfig> =
            serde_json::from_str(r#"{"status":"ok","data":{"max_value":90.0}}"#).unwrap();
        assert_eq!(env.into_result().unwrap().max_value, Some(90.0));
    }

    #[test]
    fn envelope_error_without_message_gets_fallback() {
        let env: ApiEnvelope<Vec<i32>> = serde_json::from_str(r#"{"status":"denied"}"#).unwrap();
        let err = env.into_result().unwrap_err();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn display_name_prefers_fa_name_then_name_then_key() {
        let meta: KeyMetadata = serde_json::from_str(
            r#"{"key":"t1","name":"Temp 1","fa_name":"دما ۱","order_index":2}"#,
        )
        .unwrap();
        assert_eq!(meta.display_name(), "دما ۱");

        let meta: KeyMetadata =
            serde_json::from_str(r#"{"key":"t1","name":"Temp 1","fa_name":""}"#).unwrap();
        assert_eq!(meta.display_name(), "Temp 1");

        let meta: KeyMetadata = serde_json::from_str(r#"{"key":"t1"}"#).unwrap();
        assert_eq!(meta.display_name(), "t1");
    }

    #[test]
    fn snapshot_accepts_string_and_numeric_values() {
        let snap: SettingSnapshot = serde_json::from_str(
            r#"{"LastUpdate":1700000000,"setting":{"st":"m","t1":42,"t2":"42.5"}}"#,
        )
        .unwrap();
        assert_eq!(snap.last_update, Some(1_700_000_000.0));
        assert_eq!(raw_text(&snap.setting["st"]), "m");
        assert_eq!(raw_text(&snap.setting["t1"]), "42");
        assert_eq!(raw_text(&snap.setting["t2"]), "42.5");
    }

    #[test]
    fn alert_config_falls_back_to_default_colors() {
        let cfg: AlertConfig = serde_json::from_str(r#"{"max_value":90.0}"#).unwrap();
        assert_eq!(cfg.color_max(), DEFAULT_COLOR_MAX);
        assert_eq!(cfg.color_min(), DEFAULT_COLOR_MIN);
        assert!(!cfg.alert_types.local);
    }
}

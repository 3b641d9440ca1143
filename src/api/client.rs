use std::collections::HashMap;

use anyhow::{Context, Result};
use futures_util::Stream;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::types::{AlertChannels, AlertConfig, ApiEnvelope, KeyMetadata};

/// Form fields for saving one key's alert config. Threshold fields stay
/// string-typed: the server parses them and an empty string clears the bound.
#[derive(Debug, Clone)]
pub struct SaveAlertConfigParams {
    pub key: String,
    pub min_value: String,
    pub max_value: String,
    pub color_max: String,
    pub color_min: String,
    pub alert_types: AlertChannels,
}

/// Thin client over the dashboard REST endpoints. All responses use the
/// `{status, data|message}` envelope; non-"ok" maps to an error.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Key metadata listing: display names and configured order indexes.
    pub async fn list_keys(&self) -> Result<Vec<KeyMetadata>> {
        self.get_json(&format!("{}/api/plc-keys/", self.base_url))
            .await
            .context("failed to load key metadata")
    }

    /// All alert configs in one call, keyed by setting key.
    pub async fn all_alert_configs(&self) -> Result<HashMap<String, AlertConfig>> {
        self.get_json(&format!("{}/api/alert-configs/all/", self.base_url))
            .await
            .context("failed to load alert configs")
    }

    /// Alert config for a single key. The server returns defaults for keys
    /// that have never been configured.
    pub async fn alert_config(&self, key: &str) -> Result<AlertConfig> {
        let url = format!("{}/api/alert-config/", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("key", key)])
            .send()
            .await
            .with_context(|| format!("alert config request failed for key '{key}'"))?
            .error_for_status()?;
        let envelope: ApiEnvelope<AlertConfig> = response.json().await?;
        envelope.into_result()
    }

    /// Persist one key's alert config; returns the config as stored.
    pub async fn save_alert_config(&self, params: &SaveAlertConfigParams) -> Result<AlertConfig> {
        let url = format!("{}/api/alert-config/save/", self.base_url);
        let alert_types = serde_json::to_string(&params.alert_types)?;
        let form = [
            ("key", params.key.as_str()),
            ("min_value", params.min_value.as_str()),
            ("max_value", params.max_value.as_str()),
            ("color_max", params.color_max.as_str()),
            ("color_min", params.color_min.as_str()),
            ("alert_types", alert_types.as_str()),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("alert config save failed for key '{}'", params.key))?
            .error_for_status()?;
        let envelope: ApiEnvelope<AlertConfig> = response.json().await?;
        envelope.into_result()
    }

    /// Persist the full card ordering as one atomic mapping update.
    pub async fn save_order(&self, orders: &HashMap<String, usize>) -> Result<()> {
        let url = format!("{}/api/plc-keys/order/bulk/", self.base_url);
        let payload = serde_json::to_string(orders)?;
        let response = self
            .http
            .post(&url)
            .form(&[("orders", payload.as_str())])
            .send()
            .await
            .context("order save request failed")?
            .error_for_status()?;
        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;
        envelope.ensure_ok()
    }

    /// Open the long-lived settings stream for one PLC and hand back its
    /// byte stream. Shares this client's connection pool.
    pub async fn settings_stream(
        &self,
        plc_id: &str,
    ) -> Result<impl Stream<Item = reqwest::Result<bytes::Bytes>>> {
        let response = self
            .stream_request(plc_id)
            .send()
            .await
            .context("settings stream connect failed")?
            .error_for_status()?;
        Ok(response.bytes_stream())
    }

    fn stream_request(&self, plc_id: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/api/settings/stream/", self.base_url))
            .query(&[("plc", plc_id)])
            .header("Accept", "text/event-stream")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        envelope.into_result()
    }
}

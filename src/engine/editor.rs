use crate::api::{
    AlertChannels, AlertConfig, SaveAlertConfigParams, DEFAULT_COLOR_MAX, DEFAULT_COLOR_MIN,
};

/// Editable form state for one key's alert config, mirroring the modal.
/// Threshold fields are strings: empty means "no bound", and the server
/// does the parsing on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfigForm {
    pub key: String,
    pub min_value: String,
    pub max_value: String,
    pub color_max: String,
    pub color_min: String,
    pub channels: AlertChannels,
}

impl AlertConfigForm {
    /// Blank form: no thresholds, default colors, all channels off. Used
    /// when the config fetch fails or the key was never configured.
    pub fn defaults(key: &str) -> Self {
        Self {
            key: key.to_string(),
            min_value: String::new(),
            max_value: String::new(),
            color_max: DEFAULT_COLOR_MAX.to_string(),
            color_min: DEFAULT_COLOR_MIN.to_string(),
            channels: AlertChannels::default(),
        }
    }

    pub fn from_config(key: &str, config: &AlertConfig) -> Self {
        Self {
            key: key.to_string(),
            min_value: config.min_value.map(fmt_bound).unwrap_or_default(),
            max_value: config.max_value.map(fmt_bound).unwrap_or_default(),
            color_max: config.color_max().to_string(),
            color_min: config.color_min().to_string(),
            channels: config.alert_types,
        }
    }

    pub fn to_params(&self) -> SaveAlertConfigParams {
        SaveAlertConfigParams {
            key: self.key.clone(),
            min_value: self.min_value.trim().to_string(),
            max_value: self.max_value.trim().to_string(),
            color_max: self.color_max.clone(),
            color_min: self.color_min.clone(),
            alert_types: self.channels,
        }
    }
}

fn fmt_bound(value: f64) -> String {
    // 90.0 renders as "90", 90.5 stays "90.5"; matches what a numeric
    // form input would show.
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

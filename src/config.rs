use std::env;
use std::time::Duration;

/// Tunables for the monitoring engine. Defaults match the production
/// dashboard; the timing knobs only need changing in tests or unusual
/// deployments.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the dashboard API server, no trailing slash.
    pub base_url: String,

    /// Identifier of the monitored PLC, passed to the settings stream.
    pub plc_id: String,

    /// Fixed delay before reconnecting a dropped settings stream.
    pub reconnect_backoff: Duration,

    /// Minimum change in a value (same breach direction) before a
    /// repeat notification fires.
    pub alert_epsilon: f64,

    /// Lifetime of the "new card" / "value changed" transient flags.
    pub flag_lifetime: Duration,

    /// How long the local alert banner stays visible before auto-hiding.
    pub banner_auto_hide: Duration,

    /// Fade-out grace between closing the banner and removing it.
    pub banner_fade: Duration,

    /// A press-release counts as a click only under this duration...
    pub click_max_duration: Duration,

    /// ...and under this pointer displacement (logical px).
    pub drag_min_distance: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            plc_id: "1".to_string(),
            reconnect_backoff: Duration::from_millis(3000),
            alert_epsilon: 0.01,
            flag_lifetime: Duration::from_millis(500),
            banner_auto_hide: Duration::from_secs(5),
            banner_fade: Duration::from_millis(300),
            click_max_duration: Duration::from_millis(300),
            drag_min_distance: 5.0,
        }
    }
}

impl MonitorConfig {
    /// Build a config from `PLCWATCH_*` environment variables, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(url) = env::var("PLCWATCH_BASE_URL") {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(plc) = env::var("PLCWATCH_PLC_ID") {
            cfg.plc_id = plc;
        }
        if let Some(ms) = env_u64("PLCWATCH_RECONNECT_MS") {
            cfg.reconnect_backoff = Duration::from_millis(ms);
        }
        if let Some(eps) = env::var("PLCWATCH_ALERT_EPSILON")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
        {
            cfg.alert_epsilon = eps;
        }

        cfg
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_constants() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.reconnect_backoff, Duration::from_millis(3000));
        assert_eq!(cfg.alert_epsilon, 0.01);
        assert_eq!(cfg.flag_lifetime, Duration::from_millis(500));
        assert_eq!(cfg.banner_auto_hide, Duration::from_secs(5));
        assert_eq!(cfg.banner_fade, Duration::from_millis(300));
        assert_eq!(cfg.click_max_duration, Duration::from_millis(300));
        assert_eq!(cfg.drag_min_distance, 5.0);
    }
}

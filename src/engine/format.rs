use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::jalali;

/// Shown for the last-update line when the snapshot carries no timestamp.
pub const NO_TIMESTAMP: &str = "-";

/// Symbolic display mapping for the handful of keys whose raw values are
/// mode flags rather than readings. Static, not user-configurable.
pub fn display_value(key: &str, raw: &str) -> String {
    if key == "st" {
        match raw {
            "m" => return "MAN".to_string(),
            "a" => return "AUTO".to_string(),
            _ => {}
        }
    }
    raw.to_string()
}

/// Render an epoch-seconds timestamp as `jy/jm/jd - HH:MM:SS` in the
/// Jalaali calendar. Out-of-range timestamps fall back to the placeholder.
pub fn timestamp_text(epoch_secs: Option<f64>) -> String {
    let Some(secs) = epoch_secs else {
        return NO_TIMESTAMP.to_string();
    };
    if !secs.is_finite() {
        return NO_TIMESTAMP.to_string();
    }
    let Some(dt) = DateTime::<Utc>::from_timestamp(secs as i64, 0) else {
        return NO_TIMESTAMP.to_string();
    };
    let jd = jalali::from_gregorian(dt.year(), dt.month(), dt.day());
    format!(
        "{}/{}/{} - {:02}:{:02}:{:02}",
        jd.year,
        jd.month,
        jd.day,
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_key_maps_to_mnemonics() {
        assert_eq!(display_value("st", "m"), "MAN");
        assert_eq!(display_value("st", "a"), "AUTO");
        assert_eq!(display_value("st", "x"), "x");
    }

    #[test]
    fn other_keys_pass_through() {
        assert_eq!(display_value("t1", "42.5"), "42.5");
        assert_eq!(display_value("ru", "1"), "1");
    }

    #[test]
    fn timestamp_renders_jalali() {
        // 2023-11-14 22:13:20 UTC == 1402/8/23
        assert_eq!(
            timestamp_text(Some(1_700_000_000.0)),
            "1402/8/23 - 22:13:20"
        );
    }

    #[test]
    fn missing_timestamp_renders_placeholder() {
        assert_eq!(timestamp_text(None), NO_TIMESTAMP);
        assert_eq!(timestamp_text(Some(f64::NAN)), NO_TIMESTAMP);
    }
}

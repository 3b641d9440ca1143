use crate::api::AlertConfig;
use crate::engine::card::CardStyle;

/// Where a value sits relative to its configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    None,
    BelowMin,
    AboveMax,
}

/// Last evaluation result for a configured key. Stored after every
/// evaluation, including the transition back to `None` on resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertState {
    pub classification: Breach,
    pub value: f64,
}

/// Outcome of one threshold evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub classification: Breach,
    pub value: f64,
    pub style: CardStyle,
}

/// Classify a value against its config. Max is checked first: when both
/// bounds are misconfigured to overlap, the max breach wins.
pub fn classify(value: f64, config: &AlertConfig) -> Breach {
    if let Some(max) = config.max_value {
        if value > max {
            return Breach::AboveMax;
        }
    }
    if let Some(min) = config.min_value {
        if value < min {
            return Breach::BelowMin;
        }
    }
    Breach::None
}

/// Evaluate a raw setting value against a key's config. Returns `None`
/// when the value is not a finite number; threshold alerting does not
/// apply to symbolic settings.
pub fn evaluate(raw_value: &str, config: &AlertConfig) -> Option<Evaluation> {
    let value = raw_value.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }

    let classification = classify(value, config);
    let style = match classification {
        Breach::AboveMax => CardStyle::Breach {
            color: config.color_max().to_string(),
        },
        Breach::BelowMin => CardStyle::Breach {
            color: config.color_min().to_string(),
        },
        Breach::None => CardStyle::Default,
    };

    Some(Evaluation {
        classification,
        value,
        style,
    })
}

/// Debounce rule: a breach notifies only when the classification changed,
/// or the value moved by more than epsilon while the classification held.
/// A `None` classification never notifies.
pub fn should_notify(previous: Option<&AlertState>, current: &Evaluation, epsilon: f64) -> bool {
    if current.classification == Breach::None {
        return false;
    }
    match previous {
        None => true,
        Some(prev) => {
            prev.classification != current.classification
                || (prev.value - current.value).abs() > epsilon
        }
    }
}

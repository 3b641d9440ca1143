use serde::Serialize;

/// Visual treatment of one setting card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CardStyle {
    /// No highlight.
    Default,
    /// Fixed rule: manual mode.
    Warning,
    /// Fixed rule: auto mode / running.
    Success,
    /// Threshold breach, tinted with the configured color.
    Breach { color: String },
}

/// Which transient visual state a card is in. `New` and `ValueChanged`
/// are distinct so a display layer can animate them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlagKind {
    New,
    ValueChanged,
}

/// A time-bounded visual flag. The generation ties the flag to the
/// clear-timer that was scheduled for it, so a stale timer firing after
/// the flag was replaced leaves the newer flag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransientFlag {
    pub kind: FlagKind,
    pub generation: u64,
}

/// One rendered setting. The engine owns these; a display layer only ever
/// sees their projections through events.
#[derive(Debug, Clone)]
pub struct CardViewModel {
    pub key: String,
    pub name: String,
    /// Value as shown, after symbolic formatting.
    pub display_value: String,
    /// Value as received, pre-formatting; styling works off this.
    pub raw_value: String,
    pub style: CardStyle,
    pub flag: Option<TransientFlag>,
}

impl CardViewModel {
    pub fn clear_flag_if(&mut self, generation: u64) -> bool {
        match self.flag {
            Some(flag) if flag.generation == generation => {
                self.flag = None;
                true
            }
            _ => false,
        }
    }
}

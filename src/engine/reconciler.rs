use crate::api::types::raw_text;
use crate::api::SettingSnapshot;
use crate::engine::card::{CardViewModel, FlagKind, TransientFlag};
use crate::engine::format;
use crate::engine::state::{Engine, ReconcileOutcome};
use crate::events::UiEvent;

impl Engine {
    /// Merge one full snapshot into the card grid.
    ///
    /// Existing cards update display text only when the formatted value
    /// changed, but re-run the style step unconditionally: thresholds act
    /// on the raw value even when display text is stable. Unknown keys get
    /// new cards appended, then the configured order is re-applied so
    /// insertion never disturbs the sequence. Keys absent from this
    /// snapshot keep their cards; one partial payload must not blank the
    /// dashboard.
    pub fn reconcile(&mut self, snapshot: &SettingSnapshot) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let bus = self.bus.clone();

        let text = format::timestamp_text(snapshot.last_update);
        self.set_last_update_text(text.clone());
        bus.emit(UiEvent::LastUpdateChanged { text });

        if snapshot.setting.is_empty() {
            return outcome;
        }

        for (key, value) in &snapshot.setting {
            let raw = raw_text(value);
            let display = format::display_value(key, &raw);

            let step = self.style_step(key, &raw);
            if step.notified {
                outcome.notifications += 1;
            }
            if let Some(generation) = step.banner {
                outcome.banner_shown = Some(generation);
            }

            if self.cards.contains_key(key) {
                let next_generation = self.flag_seq + 1;
                let mut flagged = false;
                if let Some(card) = self.cards.get_mut(key) {
                    if card.display_value != display {
                        card.display_value = display.clone();
                        card.flag = Some(TransientFlag {
                            kind: FlagKind::ValueChanged,
                            generation: next_generation,
                        });
                        flagged = true;
                        bus.emit(UiEvent::CardUpdated {
                            key: key.clone(),
                            value: display,
                        });
                    }
                    card.raw_value = raw;
                    if card.style != step.style {
                        card.style = step.style.clone();
                        bus.emit(UiEvent::CardStyleChanged {
                            key: key.clone(),
                            style: step.style,
                        });
                    }
                }
                if flagged {
                    self.flag_seq = next_generation;
                    outcome.flagged.push((key.clone(), next_generation));
                }
            } else {
                self.flag_seq += 1;
                let name = self.key_name(key);
                let card = CardViewModel {
                    key: key.clone(),
                    name: name.clone(),
                    display_value: display.clone(),
                    raw_value: raw,
                    style: step.style.clone(),
                    flag: Some(TransientFlag {
                        kind: FlagKind::New,
                        generation: self.flag_seq,
                    }),
                };
                self.cards.insert(key.clone(), card);
                self.sequence.push(key.clone());
                outcome.flagged.push((key.clone(), self.flag_seq));
                bus.emit(UiEvent::CardCreated {
                    key: key.clone(),
                    name,
                    value: display,
                    style: step.style,
                });
            }
        }

        if self.apply_order() {
            bus.emit(UiEvent::OrderChanged {
                sequence: self.sequence.clone(),
            });
        }

        outcome
    }
}

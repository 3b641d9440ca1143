use std::collections::HashMap;

use crate::api::{AlertConfig, KeyMetadata};
use crate::config::MonitorConfig;
use crate::engine::card::{CardStyle, CardViewModel};
use crate::engine::evaluator::{self, AlertState, Breach};
use crate::events::{EventBus, UiEvent};
use crate::notify::{AlertNotification, Banner, Notifier};

/// Session-scoped engine state: metadata caches, the card view-model map,
/// display sequence, alert states and the banner. One instance per page
/// view; everything here is reset by constructing a fresh engine.
///
/// All methods are synchronous state transitions. Timers (transient-flag
/// clears, banner auto-hide) are scheduled by the owning controller from
/// the outcomes these methods return.
pub struct Engine {
    pub(crate) cfg: MonitorConfig,
    pub(crate) bus: EventBus,
    notifier: Notifier,
    key_names: HashMap<String, String>,
    pub(crate) key_orders: HashMap<String, i64>,
    alert_configs: HashMap<String, AlertConfig>,
    alert_states: HashMap<String, AlertState>,
    pub(crate) cards: HashMap<String, CardViewModel>,
    /// Card keys in display order; the grid is a projection of this.
    pub(crate) sequence: Vec<String>,
    last_update_text: String,
    saving_order: bool,
    banner: Banner,
    pub(crate) flag_seq: u64,
}

/// What a reconcile (or re-evaluation) pass asks the controller to
/// schedule: flag-clear timers per flagged card, and at most one banner
/// auto-hide.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub flagged: Vec<(String, u64)>,
    pub banner_shown: Option<u64>,
    pub notifications: usize,
}

/// Result of the style step for one key.
pub(crate) struct StyleStep {
    pub style: CardStyle,
    pub banner: Option<u64>,
    pub notified: bool,
}

impl Engine {
    pub fn new(cfg: MonitorConfig, bus: EventBus) -> Self {
        Self {
            cfg,
            bus,
            notifier: Notifier::new(),
            key_names: HashMap::new(),
            key_orders: HashMap::new(),
            alert_configs: HashMap::new(),
            alert_states: HashMap::new(),
            cards: HashMap::new(),
            sequence: Vec::new(),
            last_update_text: String::new(),
            saving_order: false,
            banner: Banner::new(),
            flag_seq: 0,
        }
    }

    /// Replace the key metadata cache and re-apply configured ordering.
    pub fn load_key_metadata(&mut self, keys: &[KeyMetadata]) {
        self.key_names.clear();
        self.key_orders.clear();
        for meta in keys {
            self.key_names
                .insert(meta.key.clone(), meta.display_name().to_string());
            if let Some(order) = meta.order_index {
                self.key_orders.insert(meta.key.clone(), order);
            }
        }
        if self.apply_order() {
            self.bus.emit(UiEvent::OrderChanged {
                sequence: self.sequence.clone(),
            });
        }
    }

    /// Replace the alert config store and re-check every rendered card.
    pub fn set_alert_configs(
        &mut self,
        configs: HashMap<String, AlertConfig>,
    ) -> ReconcileOutcome {
        self.alert_configs = configs;
        self.reevaluate_all()
    }

    /// Install one saved config and re-check every rendered card against
    /// it immediately, without waiting for the next snapshot.
    pub fn apply_alert_config(&mut self, key: &str, config: AlertConfig) -> ReconcileOutcome {
        self.alert_configs.insert(key.to_string(), config);
        self.reevaluate_all()
    }

    pub fn alert_config(&self, key: &str) -> Option<&AlertConfig> {
        self.alert_configs.get(key)
    }

    pub fn key_name(&self, key: &str) -> String {
        self.key_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn card(&self, key: &str) -> Option<&CardViewModel> {
        self.cards.get(key)
    }

    /// Cards in current display order.
    pub fn cards_in_order(&self) -> Vec<&CardViewModel> {
        self.sequence
            .iter()
            .filter_map(|key| self.cards.get(key))
            .collect()
    }

    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn last_update_text(&self) -> &str {
        &self.last_update_text
    }

    pub(crate) fn set_last_update_text(&mut self, text: String) {
        self.last_update_text = text;
    }

    pub fn alert_state(&self, key: &str) -> Option<&AlertState> {
        self.alert_states.get(key)
    }

    pub fn saving_order(&self) -> bool {
        self.saving_order
    }

    pub fn set_saving_order(&mut self, active: bool) {
        if self.saving_order != active {
            self.saving_order = active;
            self.bus.emit(UiEvent::SavingOrder { active });
        }
    }

    /// Drop a card's transient flag if it still belongs to the timer that
    /// fired. True when the flag was actually cleared.
    pub fn clear_flag(&mut self, key: &str, generation: u64) -> bool {
        let Some(card) = self.cards.get_mut(key) else {
            return false;
        };
        if card.clear_flag_if(generation) {
            self.bus.emit(UiEvent::CardFlagCleared {
                key: key.to_string(),
            });
            true
        } else {
            false
        }
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    /// Show the local alert banner; returns the generation the auto-hide
    /// timer must carry.
    pub fn show_banner(&mut self, message: impl Into<String>) -> u64 {
        let message = message.into();
        let generation = self.banner.show(message.clone());
        self.bus.emit(UiEvent::BannerShown { message });
        generation
    }

    /// Begin hiding the banner (auto-hide or manual close). Returns the
    /// generation for the fade-end timer when a fade actually started.
    pub fn close_banner(&mut self, generation: u64) -> Option<u64> {
        let fade = self.banner.begin_close(generation)?;
        self.bus.emit(UiEvent::BannerClosing);
        Some(fade)
    }

    /// End of the fade-out grace period.
    pub fn hide_banner(&mut self, generation: u64) {
        if self.banner.finish_close(generation) {
            self.bus.emit(UiEvent::BannerHidden);
        }
    }

    /// Sort the display sequence by the configured order map: configured
    /// positions ascending, unconfigured keys last, ties by lexical key
    /// order. True when the sequence actually moved.
    pub(crate) fn apply_order(&mut self) -> bool {
        if self.key_orders.is_empty() || self.sequence.len() < 2 {
            return false;
        }
        let mut sorted = self.sequence.clone();
        sorted.sort_by(|a, b| {
            let order_a = self.key_orders.get(a).copied().unwrap_or(i64::MAX);
            let order_b = self.key_orders.get(b).copied().unwrap_or(i64::MAX);
            order_a.cmp(&order_b).then_with(|| a.cmp(b))
        });
        if sorted != self.sequence {
            self.sequence = sorted;
            true
        } else {
            false
        }
    }

    /// Compute a key's style from its raw value, firing alert dispatch as
    /// a side effect when a debounced breach transition happens.
    ///
    /// Symbolic keys use fixed rules and never touch alert state; numeric
    /// keys without a config are plain; non-numeric values under a config
    /// skip threshold alerting entirely.
    pub(crate) fn style_step(&mut self, key: &str, raw: &str) -> StyleStep {
        let plain = StyleStep {
            style: CardStyle::Default,
            banner: None,
            notified: false,
        };

        if key == "st" {
            let style = match raw {
                "m" => CardStyle::Warning,
                "a" => CardStyle::Success,
                _ => CardStyle::Default,
            };
            return StyleStep { style, ..plain };
        }
        if key == "ru" && raw == "1" {
            return StyleStep {
                style: CardStyle::Success,
                ..plain
            };
        }

        let Some(config) = self.alert_configs.get(key).cloned() else {
            return plain;
        };
        let Some(evaluation) = evaluator::evaluate(raw, &config) else {
            return plain;
        };

        let fire = evaluator::should_notify(
            self.alert_states.get(key),
            &evaluation,
            self.cfg.alert_epsilon,
        );

        let mut banner = None;
        if fire {
            let threshold = match evaluation.classification {
                Breach::AboveMax => config.max_value.unwrap_or(evaluation.value),
                Breach::BelowMin => config.min_value.unwrap_or(evaluation.value),
                Breach::None => evaluation.value,
            };
            let notification = AlertNotification {
                key: key.to_string(),
                name: self.key_name(key),
                classification: evaluation.classification,
                value: evaluation.value,
                threshold,
            };
            if self.notifier.dispatch(&config.alert_types, &notification) {
                banner = Some(self.show_banner(notification.message()));
            }
        }

        self.alert_states.insert(
            key.to_string(),
            AlertState {
                classification: evaluation.classification,
                value: evaluation.value,
            },
        );

        StyleStep {
            style: evaluation.style,
            banner,
            notified: fire,
        }
    }

    /// Re-run the style step for every rendered card, e.g. after the
    /// alert config store changed.
    pub fn reevaluate_all(&mut self) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let bus = self.bus.clone();
        for key in self.sequence.clone() {
            let Some(raw) = self.cards.get(&key).map(|card| card.raw_value.clone()) else {
                continue;
            };
            let step = self.style_step(&key, &raw);
            if step.notified {
                outcome.notifications += 1;
            }
            if let Some(generation) = step.banner {
                outcome.banner_shown = Some(generation);
            }
            if let Some(card) = self.cards.get_mut(&key) {
                if card.style != step.style {
                    card.style = step.style.clone();
                    bus.emit(UiEvent::CardStyleChanged {
                        key: key.clone(),
                        style: step.style,
                    });
                }
            }
        }
        outcome
    }
}

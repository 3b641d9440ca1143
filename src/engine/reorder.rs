use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::engine::state::Engine;
use crate::events::UiEvent;

/// Pointer position in logical pixels.
pub type Point = (f64, f64);

/// Where a press-to-release interaction currently stands. A press starts
/// as a potential click; crossing the distance threshold commits it to a
/// drag, and a drag can never fall back to a click.
#[derive(Debug, Clone, PartialEq)]
enum DragPhase {
    Idle,
    Pressed {
        key: String,
        at: Instant,
        origin: Point,
    },
    Dragging {
        key: String,
    },
}

/// What a completed interaction turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Quick press-release on one card: open its alert-config editor.
    Click { key: String },
    /// Card dropped onto a different card.
    Drop { source: String, target: String },
    /// Drag ended nowhere useful (same card, off-grid, or stray release).
    Cancelled,
}

/// Single owner of drag/click disambiguation state. Time and position
/// are injected so the heuristic is testable.
#[derive(Debug)]
pub struct DragTracker {
    phase: DragPhase,
    click_max_duration: Duration,
    drag_min_distance: f64,
}

impl DragTracker {
    pub fn new(click_max_duration: Duration, drag_min_distance: f64) -> Self {
        Self {
            phase: DragPhase::Idle,
            click_max_duration,
            drag_min_distance,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn press(&mut self, key: &str, position: Point, now: Instant) {
        self.phase = DragPhase::Pressed {
            key: key.to_string(),
            at: now,
            origin: position,
        };
    }

    pub fn motion(&mut self, position: Point) {
        if let DragPhase::Pressed { key, origin, .. } = &self.phase {
            if distance(*origin, position) >= self.drag_min_distance {
                let key = key.clone();
                self.phase = DragPhase::Dragging { key };
            }
        }
    }

    /// End the interaction. `target` is the card under the pointer, if
    /// any. Always returns to idle.
    pub fn release(&mut self, target: Option<&str>, position: Point, now: Instant) -> Gesture {
        let phase = std::mem::replace(&mut self.phase, DragPhase::Idle);
        match phase {
            DragPhase::Idle => Gesture::Cancelled,
            DragPhase::Pressed { key, at, origin } => {
                let quick = now.duration_since(at) < self.click_max_duration;
                let near = distance(origin, position) < self.drag_min_distance;
                if quick && near {
                    Gesture::Click { key }
                } else {
                    drop_or_cancel(key, target)
                }
            }
            DragPhase::Dragging { key } => drop_or_cancel(key, target),
        }
    }
}

fn drop_or_cancel(source: String, target: Option<&str>) -> Gesture {
    match target {
        Some(target) if target != source => Gesture::Drop {
            source,
            target: target.to_string(),
        },
        _ => Gesture::Cancelled,
    }
}

fn distance(a: Point, b: Point) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl Engine {
    /// Reposition `source` next to `target` (before or after, depending
    /// on which direction it travelled), then recompute the full order
    /// map as 0-based contiguous positions read off the new sequence.
    ///
    /// Local order state is updated key by key; entries for keys not in
    /// the current grid are left alone. Returns the map to persist, or
    /// `None` when the drop changes nothing.
    pub fn apply_drop(&mut self, source: &str, target: &str) -> Option<HashMap<String, usize>> {
        if source == target {
            return None;
        }
        let from = self.sequence.iter().position(|k| k == source)?;
        let to = self.sequence.iter().position(|k| k == target)?;

        let moved = self.sequence.remove(from);
        let target_index = self.sequence.iter().position(|k| k == target)?;
        if from < to {
            self.sequence.insert(target_index + 1, moved);
        } else {
            self.sequence.insert(target_index, moved);
        }

        let orders: HashMap<String, usize> = self
            .sequence
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect();
        for (key, index) in &orders {
            self.key_orders.insert(key.clone(), *index as i64);
        }

        self.bus.emit(UiEvent::OrderChanged {
            sequence: self.sequence.clone(),
        });
        Some(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SettingSnapshot;
    use crate::config::MonitorConfig;
    use crate::events::EventBus;

    fn tracker() -> DragTracker {
        DragTracker::new(Duration::from_millis(300), 5.0)
    }

    #[test]
    fn quick_still_press_is_a_click() {
        let mut t = tracker();
        let start = Instant::now();
        t.press("t1", (10.0, 10.0), start);
        let gesture = t.release(Some("t1"), (12.0, 11.0), start + Duration::from_millis(100));
        assert_eq!(gesture, Gesture::Click { key: "t1".into() });
    }

    #[test]
    fn slow_press_is_not_a_click() {
        let mut t = tracker();
        let start = Instant::now();
        t.press("t1", (10.0, 10.0), start);
        let gesture = t.release(Some("t1"), (10.0, 10.0), start + Duration::from_millis(400));
        assert_eq!(gesture, Gesture::Cancelled);
    }

    #[test]
    fn moved_press_is_not_a_click() {
        let mut t = tracker();
        let start = Instant::now();
        t.press("t1", (10.0, 10.0), start);
        let gesture = t.release(Some("t2"), (20.0, 10.0), start + Duration::from_millis(100));
        assert_eq!(
            gesture,
            Gesture::Drop {
                source: "t1".into(),
                target: "t2".into()
            }
        );
    }

    #[test]
    fn motion_past_threshold_commits_to_drag() {
        let mut t = tracker();
        let start = Instant::now();
        t.press("t1", (10.0, 10.0), start);
        assert!(!t.is_dragging());
        t.motion((16.0, 10.0));
        assert!(t.is_dragging());

        // Even a fast release back at the origin is no longer a click.
        let gesture = t.release(Some("t1"), (10.0, 10.0), start + Duration::from_millis(50));
        assert_eq!(gesture, Gesture::Cancelled);
        assert!(!t.is_dragging());
    }

    #[test]
    fn stray_release_is_cancelled() {
        let mut t = tracker();
        assert_eq!(t.release(Some("t1"), (0.0, 0.0), Instant::now()), Gesture::Cancelled);
    }

    fn engine_with_cards(keys: &[&str]) -> Engine {
        let mut engine = Engine::new(MonitorConfig::default(), EventBus::default());
        let setting: serde_json::Map<String, serde_json::Value> = keys
            .iter()
            .map(|k| (k.to_string(), serde_json::Value::String("1".into())))
            .collect();
        let snapshot: SettingSnapshot =
            serde_json::from_value(serde_json::json!({"LastUpdate":1,"setting":setting})).unwrap();
        engine.reconcile(&snapshot);
        // Pin current order so later snapshots don't re-sort lexically.
        let orders: HashMap<String, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), i))
            .collect();
        for (k, i) in &orders {
            engine.key_orders.insert(k.clone(), *i as i64);
        }
        engine
    }

    #[test]
    fn drop_forward_lands_after_target() {
        let mut engine = engine_with_cards(&["a", "b", "c", "d"]);
        let orders = engine.apply_drop("a", "c").unwrap();

        assert_eq!(engine.sequence(), ["b", "c", "a", "d"]);
        assert_eq!(orders["b"], 0);
        assert_eq!(orders["c"], 1);
        assert_eq!(orders["a"], 2);
        assert_eq!(orders["d"], 3);
    }

    #[test]
    fn drop_backward_lands_before_target() {
        let mut engine = engine_with_cards(&["a", "b", "c", "d"]);
        let orders = engine.apply_drop("d", "b").unwrap();

        assert_eq!(engine.sequence(), ["a", "d", "b", "c"]);
        assert_eq!(orders["d"], 1);
        assert_eq!(orders["b"], 2);
    }

    #[test]
    fn posted_orders_match_sequence_read_off_grid() {
        let mut engine = engine_with_cards(&["a", "b", "c"]);
        let orders = engine.apply_drop("c", "a").unwrap();
        for (index, key) in engine.sequence().iter().enumerate() {
            assert_eq!(orders[key], index);
        }
    }

    #[test]
    fn drop_on_self_or_unknown_is_a_no_op() {
        let mut engine = engine_with_cards(&["a", "b"]);
        assert!(engine.apply_drop("a", "a").is_none());
        assert!(engine.apply_drop("a", "zz").is_none());
        assert_eq!(engine.sequence(), ["a", "b"]);
    }

    #[test]
    fn order_survives_next_reconcile() {
        let mut engine = engine_with_cards(&["a", "b", "c"]);
        engine.apply_drop("c", "a").unwrap();
        assert_eq!(engine.sequence(), ["c", "a", "b"]);

        let snapshot: SettingSnapshot = serde_json::from_value(
            serde_json::json!({"LastUpdate":2,"setting":{"a":"2","b":"2","c":"2"}}),
        )
        .unwrap();
        engine.reconcile(&snapshot);
        assert_eq!(engine.sequence(), ["c", "a", "b"]);
    }
}

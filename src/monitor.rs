use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use log::{error, info, warn};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, SettingSnapshot};
use crate::config::MonitorConfig;
use crate::engine::reorder::Point;
use crate::engine::{AlertConfigForm, DragTracker, Engine, Gesture, ReconcileOutcome};
use crate::events::{EventBus, UiEvent};
use crate::stream::run_stream_loop;

/// Owns the engine for one monitored PLC: loads the metadata and alert
/// config caches, runs the settings stream, schedules every transient
/// timer, and exposes the pointer/editor operations a display layer
/// calls. Dropping the UI means calling [`Monitor::shutdown`], which
/// closes the stream and cancels all pending timers.
pub struct Monitor {
    cfg: MonitorConfig,
    engine: Arc<Mutex<Engine>>,
    api: ApiClient,
    bus: EventBus,
    cancel: CancellationToken,
    drag: Mutex<DragTracker>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    pub fn new(cfg: MonitorConfig) -> Self {
        let bus = EventBus::default();
        let engine = Engine::new(cfg.clone(), bus.clone());
        let api = ApiClient::new(cfg.base_url.clone());
        let drag = DragTracker::new(cfg.click_max_duration, cfg.drag_min_distance);
        Self {
            cfg,
            engine: Arc::new(Mutex::new(engine)),
            api,
            bus,
            cancel: CancellationToken::new(),
            drag: Mutex::new(drag),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.bus.subscribe()
    }

    /// Load the key metadata and alert config caches, then start the
    /// settings stream. Cache failures degrade (raw key labels, no
    /// alerting) instead of aborting; the dashboard must come up even
    /// when parts of the API are down.
    pub async fn start(&self) -> Result<()> {
        match self.api.list_keys().await {
            Ok(keys) => self.engine.lock().await.load_key_metadata(&keys),
            Err(err) => error!("failed to load key metadata: {err:#}"),
        }
        match self.api.all_alert_configs().await {
            Ok(configs) => {
                let outcome = self.engine.lock().await.set_alert_configs(configs);
                self.schedule_outcome(outcome);
            }
            Err(err) => error!("failed to load alert configs: {err:#}"),
        }

        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();

        let api = self.api.clone();
        let plc_id = self.cfg.plc_id.clone();
        let connect = move || {
            let api = api.clone();
            let plc_id = plc_id.clone();
            async move { api.settings_stream(&plc_id).await }
        };
        let stream_task = tokio::spawn(run_stream_loop(
            connect,
            self.cfg.reconnect_backoff,
            self.cancel.clone(),
            snapshot_tx,
            self.bus.clone(),
        ));

        let pump_task = tokio::spawn(Self::pump_snapshots(
            snapshot_rx,
            self.engine.clone(),
            self.cfg.clone(),
            self.cancel.clone(),
        ));

        let mut tasks = self.tasks.lock().await;
        tasks.push(stream_task);
        tasks.push(pump_task);
        info!("monitor started for plc {}", self.cfg.plc_id);
        Ok(())
    }

    /// Stop the stream and every pending timer. Must run before the page
    /// equivalent goes away so no callback fires against torn-down state.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    error!("monitor task failed: {err}");
                }
            }
        }
        info!("monitor stopped");
    }

    async fn pump_snapshots(
        mut snapshots: mpsc::UnboundedReceiver<SettingSnapshot>,
        engine: Arc<Mutex<Engine>>,
        cfg: MonitorConfig,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                snapshot = snapshots.recv() => {
                    let Some(snapshot) = snapshot else { break };
                    let outcome = engine.lock().await.reconcile(&snapshot);
                    schedule_outcome(&engine, &cfg, &token, outcome);
                }
                _ = token.cancelled() => break,
            }
        }
    }

    /// Apply one snapshot directly, bypassing the stream. Used by tests
    /// and by embedders that bring their own transport.
    pub async fn reconcile(&self, snapshot: &SettingSnapshot) {
        let outcome = self.engine.lock().await.reconcile(snapshot);
        self.schedule_outcome(outcome);
    }

    /// Shared view of the engine for rendering.
    pub fn engine(&self) -> &Arc<Mutex<Engine>> {
        &self.engine
    }

    pub async fn pointer_pressed(&self, key: &str, position: Point) {
        self.drag.lock().await.press(key, position, Instant::now());
    }

    pub async fn pointer_moved(&self, position: Point) {
        self.drag.lock().await.motion(position);
    }

    /// Finish a press-release interaction. A quick, still release is a
    /// click: the caller should open the alert-config editor for the
    /// returned key. A drop reorders and persists; anything else is
    /// ignored.
    pub async fn pointer_released(&self, target: Option<&str>, position: Point) -> Option<String> {
        let gesture = self
            .drag
            .lock()
            .await
            .release(target, position, Instant::now());
        match gesture {
            Gesture::Click { key } => Some(key),
            Gesture::Drop { source, target } => {
                let orders = self.engine.lock().await.apply_drop(&source, &target);
                if let Some(orders) = orders {
                    self.persist_order(orders).await;
                }
                None
            }
            Gesture::Cancelled => None,
        }
    }

    /// Persist the reordered sequence. The optimistic in-page order is
    /// kept on failure; the user is told via the banner instead of
    /// having their arrangement snapped back.
    async fn persist_order(&self, orders: std::collections::HashMap<String, usize>) {
        self.engine.lock().await.set_saving_order(true);
        let result = self.api.save_order(&orders).await;
        {
            let mut engine = self.engine.lock().await;
            engine.set_saving_order(false);
            if let Err(err) = &result {
                error!("failed to save settings order: {err:#}");
                let generation = engine.show_banner("Failed to save card order");
                drop(engine);
                self.schedule_banner(generation);
            }
        }
    }

    /// Fetch the form for one key's alert config. Falls back to a blank
    /// default form when the fetch fails, matching the modal's behavior.
    pub async fn open_editor(&self, key: &str) -> AlertConfigForm {
        match self.api.alert_config(key).await {
            Ok(config) => AlertConfigForm::from_config(key, &config),
            Err(err) => {
                warn!("failed to load alert config for '{key}': {err:#}");
                AlertConfigForm::defaults(key)
            }
        }
    }

    /// Save an edited config. On success the config store updates and
    /// every rendered card re-evaluates immediately. On failure an error
    /// banner shows and the error propagates so the editor stays open.
    pub async fn save_editor(&self, form: &AlertConfigForm) -> Result<()> {
        match self.api.save_alert_config(&form.to_params()).await {
            Ok(config) => {
                let (outcome, generation) = {
                    let mut engine = self.engine.lock().await;
                    let outcome = engine.apply_alert_config(&form.key, config);
                    let generation = engine.show_banner("Alert settings saved");
                    (outcome, generation)
                };
                self.schedule_outcome(outcome);
                self.schedule_banner(generation);
                Ok(())
            }
            Err(err) => {
                error!("failed to save alert config for '{}': {err:#}", form.key);
                let generation = self
                    .engine
                    .lock()
                    .await
                    .show_banner(format!("Error saving alert settings: {err}"));
                self.schedule_banner(generation);
                Err(err.context("alert config save rejected"))
            }
        }
    }

    /// Manually close the banner (the user hit the X). The fade-end
    /// timer is scheduled here like everywhere else.
    pub async fn close_banner(&self) {
        let fade = {
            let mut engine = self.engine.lock().await;
            let generation = engine.banner().generation();
            engine.close_banner(generation)
        };
        if let Some(fade) = fade {
            self.schedule_fade(fade);
        }
    }

    fn schedule_outcome(&self, outcome: ReconcileOutcome) {
        schedule_outcome(&self.engine, &self.cfg, &self.cancel, outcome);
    }

    fn schedule_banner(&self, generation: u64) {
        schedule_banner(&self.engine, &self.cfg, &self.cancel, generation);
    }

    fn schedule_fade(&self, generation: u64) {
        schedule_fade(&self.engine, &self.cfg, &self.cancel, generation);
    }
}

/// Spawn the clear/hide timers an engine outcome asks for. Every timer
/// selects on the cancellation token so teardown leaves nothing pending.
fn schedule_outcome(
    engine: &Arc<Mutex<Engine>>,
    cfg: &MonitorConfig,
    token: &CancellationToken,
    outcome: ReconcileOutcome,
) {
    for (key, generation) in outcome.flagged {
        let engine = engine.clone();
        let token = token.clone();
        let lifetime = cfg.flag_lifetime;
        tokio::spawn(async move {
            tokio::select! {
                _ = sleep(lifetime) => {
                    engine.lock().await.clear_flag(&key, generation);
                }
                _ = token.cancelled() => {}
            }
        });
    }
    if let Some(generation) = outcome.banner_shown {
        schedule_banner(engine, cfg, token, generation);
    }
}

fn schedule_banner(
    engine: &Arc<Mutex<Engine>>,
    cfg: &MonitorConfig,
    token: &CancellationToken,
    generation: u64,
) {
    let engine = engine.clone();
    let token = token.clone();
    let auto_hide = cfg.banner_auto_hide;
    let fade = cfg.banner_fade;
    tokio::spawn(async move {
        tokio::select! {
            _ = sleep(auto_hide) => {
                let fade_generation = engine.lock().await.close_banner(generation);
                if let Some(fade_generation) = fade_generation {
                    tokio::select! {
                        _ = sleep(fade) => {
                            engine.lock().await.hide_banner(fade_generation);
                        }
                        _ = token.cancelled() => {}
                    }
                }
            }
            _ = token.cancelled() => {}
        }
    });
}

fn schedule_fade(
    engine: &Arc<Mutex<Engine>>,
    cfg: &MonitorConfig,
    token: &CancellationToken,
    generation: u64,
) {
    let engine = engine.clone();
    let token = token.clone();
    let fade = cfg.banner_fade;
    tokio::spawn(async move {
        tokio::select! {
            _ = sleep(fade) => {
                engine.lock().await.hide_banner(generation);
            }
            _ = token.cancelled() => {}
        }
    });
}

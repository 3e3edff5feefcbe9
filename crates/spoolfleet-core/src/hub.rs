// ── Fleet hub ──
//
// Full lifecycle management for a backend connection. Owns the HTTP
// client, the device event stream, the reactive DataStore, and the
// engine task that runs every per-device reconciler. Consumers hold a
// cheaply cloneable handle and observe state through watch channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use spoolfleet_api::{BackendClient, EventStreamHandle, ReconnectConfig};

use crate::error::CoreError;
use crate::live::reconciler::{DeviceReconciler, DisplaySnapshot, SyncRequest};
use crate::model::{PrinterStatus, QueueItem, QueueStatus, Spool};
use crate::queue::{feasible_queue, next_up, LoadedFilamentSet, NextUp};
use crate::store::DataStore;
use crate::telemetry::{self, TelemetryEvent};
use crate::workflow::{Capabilities, ClearPlateFlow, ClearPlatePrompt, CAP_CLEAR_PLATE};

const ENGINE_CHANNEL_SIZE: usize = 256;

/// How often the engine sweeps for devices that stopped sending events.
const HEARTBEAT_SWEEP_SECS: u64 = 5;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── HubConfig ────────────────────────────────────────────────────

/// Runtime configuration for a [`FleetHub`].
///
/// Built by the CLI from the config crate; core never reads config files.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Backend base URL, e.g. `http://fleet:8000`.
    pub backend_url: Url,
    /// Static API key sent on every request.
    pub api_key: SecretString,
    /// Device event WebSocket URL. Derived from `backend_url` when unset.
    pub events_url: Option<Url>,
    /// Enable the device event stream.
    pub events_enabled: bool,
    /// Request timeout.
    pub timeout: Duration,
    /// How often to poll printer/spool/queue state (seconds). 0 = never.
    pub status_poll_secs: u64,
    /// A device with no events for this long is swept offline.
    pub heartbeat_timeout_secs: u64,
    /// Empty-spool fallback weight for inventory records without one.
    pub default_core_weight_g: f64,
    /// Capabilities granted to this session's API key.
    pub capabilities: Capabilities,
}

impl HubConfig {
    /// A config with production defaults for the given backend.
    pub fn new(backend_url: Url, api_key: SecretString) -> Self {
        Self {
            backend_url,
            api_key,
            events_url: None,
            events_enabled: true,
            timeout: Duration::from_secs(30),
            status_poll_secs: 15,
            heartbeat_timeout_secs: 30,
            default_core_weight_g: crate::live::matcher::DEFAULT_CORE_WEIGHT_G,
            capabilities: Capabilities::new([CAP_CLEAR_PLATE]),
        }
    }

    /// The effective event stream URL: explicit, or derived from the
    /// backend URL (`http` -> `ws`, path `/api/ws/devices`).
    fn effective_events_url(&self) -> Result<Url, CoreError> {
        if let Some(url) = &self.events_url {
            return Ok(url.clone());
        }

        let mut url = self.backend_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|()| CoreError::Config {
            message: format!("cannot derive WebSocket URL from {}", self.backend_url),
        })?;
        url.set_path("/api/ws/devices");
        Ok(url)
    }
}

// ── Engine messages ──────────────────────────────────────────────

/// Everything the engine task reacts to, funneled through one channel
/// so per-device processing stays strictly ordered by arrival.
enum EngineMsg {
    Telemetry(TelemetryEvent),
    Dismiss {
        device_id: String,
    },
    SyncDone {
        device_id: String,
        spool_id: i64,
        result: Result<(), String>,
    },
}

// ── Queue view ───────────────────────────────────────────────────

/// Everything a consumer needs to render one printer's queue panel.
#[derive(Debug, Clone)]
pub struct QueueView {
    pub printer_id: i64,
    /// Pending items this printer can start, in position order.
    pub feasible: Vec<Arc<QueueItem>>,
    pub next_up: Option<NextUp>,
    /// All pending items, feasible or not.
    pub pending_total: usize,
}

// ── FleetHub ─────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`. Manages the full connection
/// lifecycle: initial refresh, periodic polling, the device event
/// stream, and the reconciliation engine.
#[derive(Clone)]
pub struct FleetHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    client: BackendClient,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    engine_tx: mpsc::Sender<EngineMsg>,
    engine_rx: Mutex<Option<mpsc::Receiver<EngineMsg>>>,
    /// Per-device snapshot receivers, registered by the engine as
    /// devices first appear.
    displays: DashMap<String, watch::Receiver<DisplaySnapshot>>,
    /// Per-printer clear-plate state machines.
    flows: DashMap<i64, ClearPlateFlow>,
    cancel: CancellationToken,
    events: Mutex<Option<EventStreamHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl FleetHub {
    /// Create a hub from configuration. Does NOT connect -- call
    /// [`connect()`](Self::connect) to load data and start background tasks.
    pub fn new(config: HubConfig) -> Result<Self, CoreError> {
        let client = BackendClient::with_timeout(
            config.backend_url.clone(),
            config.api_key.expose_secret(),
            config.timeout,
        )?;

        let store = Arc::new(DataStore::new());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (engine_tx, engine_rx) = mpsc::channel(ENGINE_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                client,
                store,
                connection_state,
                engine_tx,
                engine_rx: Mutex::new(Some(engine_rx)),
                displays: DashMap::new(),
                flows: DashMap::new(),
                cancel: CancellationToken::new(),
                events: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Performs the initial full refresh and spawns background tasks
    /// (periodic polling, event stream, reconciliation engine).
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        if let Err(e) = self.full_refresh().await {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e);
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.engine_rx.lock().await.take() {
            let hub = self.clone();
            handles.push(tokio::spawn(engine_task(hub, rx)));
        }

        if self.inner.config.events_enabled {
            let ws_url = self.inner.config.effective_events_url()?;
            let events = EventStreamHandle::connect(
                ws_url,
                ReconnectConfig::default(),
                self.inner.cancel.child_token(),
            );

            let mut event_rx = events.subscribe();
            let engine_tx = self.inner.engine_tx.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(async move {
                forward_events(&mut event_rx, &engine_tx, &cancel).await;
            }));

            *self.inner.events.lock().await = Some(events);
        }

        let interval_secs = self.inner.config.status_poll_secs;
        if interval_secs > 0 {
            let hub = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(refresh_task(hub, interval_secs, cancel)));
        }

        drop(handles);
        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!("connected to backend");
        Ok(())
    }

    /// Disconnect: cancel and join background tasks, tear down the
    /// event stream, and reset the connection state.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        if let Some(events) = self.inner.events.lock().await.take() {
            events.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Fetch spools, printer statuses, and each printer's pending queue
    /// from the backend and apply them to the store.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let client = &self.inner.client;

        let (spools_res, statuses_res) =
            tokio::join!(client.list_spools(false), client.list_printer_statuses());

        let spools: Vec<Spool> = spools_res?.into_iter().map(Spool::from).collect();
        let statuses: Vec<PrinterStatus> =
            statuses_res?.into_iter().map(PrinterStatus::from).collect();
        let printer_ids: Vec<i64> = statuses.iter().map(|s| s.id).collect();

        self.inner.store.apply_spools(spools);
        self.inner.store.apply_printer_statuses(statuses);

        for printer_id in printer_ids {
            match client.get_queue(printer_id, "pending").await {
                Ok(items) => {
                    let items: Vec<QueueItem> =
                        items.into_iter().map(QueueItem::from).collect();
                    self.inner.store.apply_queue(printer_id, items);
                }
                // One printer's queue failing must not abort the whole
                // refresh cycle.
                Err(e) => warn!(printer_id, error = %e, "queue refresh failed"),
            }

            if let Some(mut flow) = self.inner.flows.get_mut(&printer_id) {
                flow.acknowledge_refresh();
            }
        }

        self.inner.store.mark_refreshed();
        debug!(
            spools = self.inner.store.spool_count(),
            printers = self.inner.store.printer_count(),
            queue_items = self.inner.store.queue_item_count(),
            "data refresh complete"
        );

        Ok(())
    }

    /// Fetch the spool inventory directly, optionally including
    /// archived records. The refresh cycle only tracks active spools;
    /// this is for inventory browsing.
    pub async fn list_spools(&self, include_archived: bool) -> Result<Vec<Spool>, CoreError> {
        let dtos = self.inner.client.list_spools(include_archived).await?;
        Ok(dtos.into_iter().map(Spool::from).collect())
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Device ids the engine has seen so far.
    pub fn device_ids(&self) -> Vec<String> {
        self.inner.displays.iter().map(|r| r.key().clone()).collect()
    }

    /// Subscribe to one device's display snapshots. `None` until the
    /// device has produced its first event.
    pub fn display(&self, device_id: &str) -> Option<watch::Receiver<DisplaySnapshot>> {
        self.inner.displays.get(device_id).map(|r| r.value().clone())
    }

    // ── Live actions ─────────────────────────────────────────────

    /// Dismiss the card currently presented on a device.
    pub async fn dismiss(&self, device_id: &str) -> Result<(), CoreError> {
        self.inner
            .engine_tx
            .send(EngineMsg::Dismiss {
                device_id: device_id.to_owned(),
            })
            .await
            .map_err(|_| CoreError::Disconnected)
    }

    // ── Queue & workflow ─────────────────────────────────────────

    /// Compute the feasibility-filtered queue view for a printer.
    pub fn queue_view(&self, printer_id: i64) -> Result<QueueView, CoreError> {
        let printer = self
            .inner
            .store
            .printer_status(printer_id)
            .ok_or_else(|| CoreError::PrinterNotFound {
                identifier: printer_id.to_string(),
            })?;

        let items = self.inner.store.queue_for_printer(printer_id);
        let loaded = LoadedFilamentSet::from_printer(&printer);
        let feasible = feasible_queue(&items, &loaded);
        let pending_total = items
            .iter()
            .filter(|i| i.status == QueueStatus::Pending)
            .count();

        Ok(QueueView {
            printer_id,
            next_up: next_up(&feasible),
            feasible,
            pending_total,
        })
    }

    /// The clear-plate affordance to show for a printer right now.
    pub fn clear_plate_prompt(&self, printer_id: i64) -> Result<ClearPlatePrompt, CoreError> {
        let printer = self
            .inner
            .store
            .printer_status(printer_id)
            .ok_or_else(|| CoreError::PrinterNotFound {
                identifier: printer_id.to_string(),
            })?;
        let feasible_count = self.queue_view(printer_id)?.feasible.len();

        let flow = self.inner.flows.entry(printer_id).or_default();
        Ok(flow.prompt(&printer, feasible_count, &self.inner.config.capabilities))
    }

    /// Run the clear-plate workflow for a printer: dispatch the clear,
    /// record the outcome, and refresh the printer's status and queue
    /// on success.
    pub async fn clear_plate(&self, printer_id: i64) -> Result<(), CoreError> {
        if !self.inner.config.capabilities.can_clear_plate() {
            return Err(CoreError::PermissionDenied {
                capability: CAP_CLEAR_PLATE.to_owned(),
            });
        }

        self.inner.flows.entry(printer_id).or_default().begin();

        let response = match self.inner.client.clear_plate(printer_id).await {
            Ok(response) => response,
            Err(e) => {
                self.inner
                    .flows
                    .entry(printer_id)
                    .or_default()
                    .complete(false, Some(e.to_string()));
                return Err(e.into());
            }
        };

        if !response.success {
            warn!(printer_id, message = %response.message, "clear-plate rejected");
            self.inner
                .flows
                .entry(printer_id)
                .or_default()
                .complete(false, Some(response.message.clone()));
            return Err(CoreError::Rejected {
                message: response.message,
            });
        }

        info!(printer_id, "plate cleared");
        self.inner
            .flows
            .entry(printer_id)
            .or_default()
            .complete(true, None);

        self.refresh_printer(printer_id).await;
        Ok(())
    }

    /// Re-fetch one printer's status and pending queue after a control
    /// action. Best-effort: the periodic poll will catch up regardless.
    async fn refresh_printer(&self, printer_id: i64) {
        match self.inner.client.get_printer_status(printer_id).await {
            Ok(dto) => self
                .inner
                .store
                .apply_printer_status(PrinterStatus::from(dto)),
            Err(e) => warn!(printer_id, error = %e, "printer status refresh failed"),
        }

        match self.inner.client.get_queue(printer_id, "pending").await {
            Ok(items) => {
                let items: Vec<QueueItem> = items.into_iter().map(QueueItem::from).collect();
                self.inner.store.apply_queue(printer_id, items);
            }
            Err(e) => warn!(printer_id, error = %e, "queue refresh failed"),
        }

        if let Some(mut flow) = self.inner.flows.get_mut(&printer_id) {
            flow.acknowledge_refresh();
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh data from the backend. Fixed-interval polling:
/// a failed cycle is logged and superseded by the next one.
async fn refresh_task(hub: FleetHub, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = hub.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Normalize raw device frames and feed them to the engine in arrival
/// order.
async fn forward_events(
    event_rx: &mut tokio::sync::broadcast::Receiver<Arc<spoolfleet_api::DeviceEvent>>,
    engine_tx: &mpsc::Sender<EngineMsg>,
    cancel: &CancellationToken,
) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = event_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if let Some(event) = telemetry::normalize(&frame) {
                            if engine_tx.send(EngineMsg::Telemetry(event)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "telemetry consumer lagged, frames dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

/// The reconciliation engine: sole owner of every per-device
/// reconciler. Processes one message at a time, so per-device ordering
/// follows arrival order; weight syncs run as spawned requests that
/// post their outcome back through the same channel.
async fn engine_task(hub: FleetHub, mut rx: mpsc::Receiver<EngineMsg>) {
    let cancel = hub.inner.cancel.clone();
    let mut reconcilers: HashMap<String, DeviceReconciler> = HashMap::new();
    let mut sweep = tokio::time::interval(Duration::from_secs(HEARTBEAT_SWEEP_SECS));
    sweep.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sweep.tick() => {
                sweep_heartbeats(&hub, &mut reconcilers);
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                handle_engine_msg(&hub, &mut reconcilers, msg);
            }
        }
    }

    debug!("engine task exiting");
}

fn handle_engine_msg(
    hub: &FleetHub,
    reconcilers: &mut HashMap<String, DeviceReconciler>,
    msg: EngineMsg,
) {
    match msg {
        EngineMsg::Telemetry(event) => {
            let device_id = event.device_id().to_owned();
            let reconciler = reconcilers.entry(device_id.clone()).or_insert_with(|| {
                let reconciler = DeviceReconciler::new(
                    device_id.clone(),
                    hub.inner.config.default_core_weight_g,
                );
                hub.inner
                    .displays
                    .insert(device_id.clone(), reconciler.subscribe());
                info!(device = %device_id, "new device seen");
                reconciler
            });

            let spools = hub.inner.store.spools_snapshot();
            if let Some(request) = reconciler.handle(&event, &spools) {
                dispatch_sync(hub, request);
            }
        }

        EngineMsg::Dismiss { device_id } => {
            if let Some(reconciler) = reconcilers.get_mut(&device_id) {
                reconciler.dismiss();
            } else {
                debug!(device = %device_id, "dismiss for unknown device ignored");
            }
        }

        EngineMsg::SyncDone {
            device_id,
            spool_id,
            result,
        } => {
            if let Some(reconciler) = reconcilers.get_mut(&device_id) {
                reconciler.sync_done(spool_id, result);
            }
        }
    }
}

/// Fire the weight-sync API call without blocking the engine. The
/// outcome re-enters the engine channel, and a successful write updates
/// the stored spool immediately rather than waiting for the next poll.
fn dispatch_sync(hub: &FleetHub, request: SyncRequest) {
    let client = hub.inner.client.clone();
    let store = Arc::clone(&hub.inner.store);
    let engine_tx = hub.inner.engine_tx.clone();
    let SyncRequest {
        device_id,
        spool_id,
        grams,
    } = request;

    tokio::spawn(async move {
        let result = match client.update_spool_weight(spool_id, grams).await {
            Ok(dto) => {
                store.apply_spool(Spool::from(dto));
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        };

        let _ = engine_tx
            .send(EngineMsg::SyncDone {
                device_id,
                spool_id,
                result,
            })
            .await;
    });
}

/// Mark devices offline when no event has arrived within the timeout.
fn sweep_heartbeats(hub: &FleetHub, reconcilers: &mut HashMap<String, DeviceReconciler>) {
    let timeout = chrono::Duration::seconds(
        i64::try_from(hub.inner.config.heartbeat_timeout_secs).unwrap_or(i64::MAX),
    );
    let now = chrono::Utc::now();

    for reconciler in reconcilers.values_mut() {
        if reconciler.heartbeat_expired(now, timeout) {
            warn!(device = %reconciler.device_id(), "heartbeat timeout, marking offline");
            reconciler.mark_offline();
        }
    }
}

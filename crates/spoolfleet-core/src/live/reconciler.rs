// ── Presentation-persistence reconciler ──
//
// One per device, owned by the hub's engine task. Consumes normalized
// telemetry in arrival order and maintains:
//   - the presentation state machine (what card the display shows),
//   - the debounced display weight,
//   - the exactly-once weight sync guard.
//
// Mutating methods may hand back a `SyncRequest`; the caller dispatches
// it (fire-and-forget API call) and later reports `sync_done`. The
// guard is armed at dispatch time, so a request is issued at most once
// per matched spool no matter how many stable readings follow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::live::matcher::{self, MatchOutcome, SpoolReadout};
use crate::live::stability::StabilityFilter;
use crate::model::Spool;
use crate::telemetry::{TelemetryEvent, WeightSample};

// ── Presentation state ──────────────────────────────────────────────

/// What the device display is currently committed to.
#[derive(Debug, Clone)]
enum Presentation {
    /// No tag on the reader.
    Idle,
    /// A tag is presented (matched or not).
    Presenting { uid: String, outcome: MatchOutcome },
    /// The user dismissed the current tag's card; it stays dismissed
    /// until the tag leaves the reader.
    Dismissed { uid: String },
}

// ── Published snapshot ──────────────────────────────────────────────

/// The card a consumer should render for a device.
#[derive(Debug, Clone, Default)]
pub enum DisplayCard {
    /// Nothing presented (idle, dismissed, or offline).
    #[default]
    Empty,
    /// A recognized spool with its derived weight readout.
    KnownSpool {
        spool: Arc<Spool>,
        readout: SpoolReadout,
    },
    /// A tag no inventory spool claims.
    UnknownTag { uid: String },
}

/// Point-in-time view of one device, published through a `watch`.
#[derive(Debug, Clone, Default)]
pub struct DisplaySnapshot {
    pub device_id: String,
    pub online: bool,
    /// Debounced display weight in grams, `None` before any reading.
    pub display_weight_g: Option<f64>,
    pub card: DisplayCard,
}

/// A weight write the caller should dispatch to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub device_id: String,
    pub spool_id: i64,
    pub grams: u32,
}

// ── Reconciler ──────────────────────────────────────────────────────

/// Per-device reconciliation state machine.
pub struct DeviceReconciler {
    device_id: String,
    online: bool,
    filter: StabilityFilter,
    presentation: Presentation,
    last_sample: Option<WeightSample>,
    /// Spool id of the most recently dispatched weight sync. Blocks
    /// re-syncing the same spool; only a *different* spool syncing
    /// moves it.
    last_synced_spool_id: Option<i64>,
    default_core_weight_g: f64,
    last_event_at: DateTime<Utc>,
    snapshot_tx: watch::Sender<DisplaySnapshot>,
}

impl DeviceReconciler {
    pub fn new(device_id: impl Into<String>, default_core_weight_g: f64) -> Self {
        let device_id = device_id.into();
        let (snapshot_tx, _) = watch::channel(DisplaySnapshot {
            device_id: device_id.clone(),
            ..DisplaySnapshot::default()
        });

        Self {
            device_id,
            online: false,
            filter: StabilityFilter::new(),
            presentation: Presentation::Idle,
            last_sample: None,
            last_synced_spool_id: None,
            default_core_weight_g,
            last_event_at: Utc::now(),
            snapshot_tx,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// When the last telemetry event for this device arrived.
    pub fn last_event_at(&self) -> DateTime<Utc> {
        self.last_event_at
    }

    /// Whether the device has gone quiet past the heartbeat timeout.
    /// Already-offline devices never expire again.
    pub fn heartbeat_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.online && now - self.last_event_at > timeout
    }

    /// Subscribe to this device's published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshot_tx.borrow().clone()
    }

    // ── Event handling ──────────────────────────────────────────────

    /// Apply one telemetry event against the current spool inventory.
    ///
    /// Returns a [`SyncRequest`] when a weight write should be
    /// dispatched; the guard is already armed when it is returned.
    pub fn handle(
        &mut self,
        event: &TelemetryEvent,
        spools: &[Arc<Spool>],
    ) -> Option<SyncRequest> {
        self.last_event_at = Utc::now();

        let sync = match event {
            TelemetryEvent::Weight(sample) => self.on_weight(sample.clone()),
            TelemetryEvent::TagDetected { uid, .. } => self.on_tag_detected(uid, spools),
            TelemetryEvent::TagRemoved { .. } => {
                self.on_tag_removed();
                None
            }
            TelemetryEvent::DeviceOnline { .. } => {
                if !self.online {
                    debug!(device = %self.device_id, "device online");
                }
                self.online = true;
                None
            }
            TelemetryEvent::DeviceOffline { .. } => {
                self.on_offline();
                None
            }
        };

        self.publish();
        sync
    }

    /// Dismiss the currently presented card. The same tag will not
    /// re-present until it leaves the reader.
    pub fn dismiss(&mut self) {
        if let Presentation::Presenting { uid, .. } = &self.presentation {
            debug!(device = %self.device_id, %uid, "card dismissed");
            self.presentation = Presentation::Dismissed { uid: uid.clone() };
            self.publish();
        }
    }

    /// Record the outcome of a previously dispatched weight sync.
    ///
    /// A failure is logged and nothing else: the displayed state never
    /// reverts, and the guard stays armed (at most one attempt per
    /// spool). Completions for spools no longer presented are ignored.
    pub fn sync_done(&mut self, spool_id: i64, result: Result<(), String>) {
        let still_presented = self
            .presented_spool()
            .is_some_and(|spool| spool.id == spool_id);

        match result {
            Ok(()) => {
                info!(device = %self.device_id, spool_id, "weight sync recorded");
            }
            Err(reason) => {
                warn!(device = %self.device_id, spool_id, %reason, "weight sync failed");
            }
        }

        if !still_presented {
            debug!(
                device = %self.device_id,
                spool_id,
                "sync completion arrived after presentation changed, ignored"
            );
        }
    }

    // ── Transitions ─────────────────────────────────────────────────

    fn on_weight(&mut self, sample: WeightSample) -> Option<SyncRequest> {
        self.online = true;
        self.filter.update(Some(&sample));
        self.last_sample = Some(sample);
        self.maybe_sync()
    }

    fn on_tag_detected(&mut self, uid: &str, spools: &[Arc<Spool>]) -> Option<SyncRequest> {
        self.online = true;

        // A dismissed tag stays dismissed while it sits on the reader.
        if matches!(&self.presentation, Presentation::Dismissed { uid: d } if d == uid) {
            return None;
        }

        // Any other tag interrupts whatever is shown, dismissal included.
        let outcome = matcher::match_tag(uid, spools);
        match &outcome {
            MatchOutcome::Matched(spool) => {
                debug!(device = %self.device_id, %uid, spool_id = spool.id, "tag matched");
            }
            MatchOutcome::Unmatched => {
                debug!(device = %self.device_id, %uid, "tag unknown");
            }
        }
        self.presentation = Presentation::Presenting {
            uid: uid.to_owned(),
            outcome,
        };

        self.maybe_sync()
    }

    fn on_tag_removed(&mut self) {
        self.online = true;
        // Leaving the reader clears a standing dismissal, so the same
        // tag presents again next time.
        self.presentation = Presentation::Idle;
        // The reading belonged to the departed spool. Without this a
        // retained stable sample would sync the next tag's spool with
        // the previous spool's grams.
        self.filter.reset();
        self.last_sample = None;
    }

    fn on_offline(&mut self) {
        info!(device = %self.device_id, "device offline, resetting live state");
        self.online = false;
        self.presentation = Presentation::Idle;
        self.filter.reset();
        self.last_sample = None;
        self.last_synced_spool_id = None;
    }

    /// Mark the device offline without a telemetry event (heartbeat
    /// timeout sweep).
    pub fn mark_offline(&mut self) {
        self.on_offline();
        self.publish();
    }

    // ── Weight sync guard ───────────────────────────────────────────

    /// Dispatch a weight sync if a stable reading coincides with a
    /// presented, matched spool that has not synced yet.
    fn maybe_sync(&mut self) -> Option<SyncRequest> {
        let sample = self.last_sample.as_ref().filter(|s| s.stable)?;
        let spool = self.presented_spool()?;

        if self.last_synced_spool_id == Some(spool.id) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let grams = sample.grams.max(0.0).round() as u32;
        let request = SyncRequest {
            device_id: self.device_id.clone(),
            spool_id: spool.id,
            grams,
        };

        // Armed at dispatch: later stable readings of the same spool
        // cannot re-fire, regardless of how the request turns out.
        self.last_synced_spool_id = Some(request.spool_id);
        info!(
            device = %self.device_id,
            spool_id = request.spool_id,
            grams,
            "dispatching weight sync"
        );
        Some(request)
    }

    fn presented_spool(&self) -> Option<&Arc<Spool>> {
        match &self.presentation {
            Presentation::Presenting { outcome, .. } => outcome.spool(),
            _ => None,
        }
    }

    // ── Snapshot publication ────────────────────────────────────────

    fn publish(&self) {
        let display_weight_g = self.filter.current();

        let card = match &self.presentation {
            Presentation::Idle | Presentation::Dismissed { .. } => DisplayCard::Empty,
            Presentation::Presenting { uid, outcome } => match outcome {
                MatchOutcome::Matched(spool) => DisplayCard::KnownSpool {
                    spool: Arc::clone(spool),
                    readout: matcher::readout(
                        spool,
                        display_weight_g.unwrap_or(0.0),
                        self.default_core_weight_g,
                    ),
                },
                MatchOutcome::Unmatched => DisplayCard::UnknownTag { uid: uid.clone() },
            },
        };

        self.snapshot_tx.send_replace(DisplaySnapshot {
            device_id: self.device_id.clone(),
            online: self.online,
            display_weight_g,
            card,
        });
    }
}

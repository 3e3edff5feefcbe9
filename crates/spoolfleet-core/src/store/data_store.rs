// ── Central reactive data store ──
//
// Thread-safe, lock-free storage for all spoolfleet domain entities.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{PrinterStatus, QueueItem, Spool};
use crate::stream::EntityStream;

/// Central reactive store for spools, printer statuses, and queue items.
///
/// Thread-safe and lock-free: all reads are wait-free, writes use
/// fine-grained per-shard locks within `DashMap`. Mutations are
/// broadcast to subscribers via `watch` channels.
pub struct DataStore {
    pub(crate) spools: EntityCollection<Spool>,
    pub(crate) printers: EntityCollection<PrinterStatus>,
    pub(crate) queue_items: EntityCollection<QueueItem>,
    pub(crate) last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_full_refresh, _) = watch::channel(None);

        Self {
            spools: EntityCollection::new(),
            printers: EntityCollection::new(),
            queue_items: EntityCollection::new(),
            last_full_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn spools_snapshot(&self) -> Arc<Vec<Arc<Spool>>> {
        self.spools.snapshot()
    }

    pub fn printers_snapshot(&self) -> Arc<Vec<Arc<PrinterStatus>>> {
        self.printers.snapshot()
    }

    pub fn queue_snapshot(&self) -> Arc<Vec<Arc<QueueItem>>> {
        self.queue_items.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn spool(&self, id: i64) -> Option<Arc<Spool>> {
        self.spools.get(&id.to_string())
    }

    /// Linear scan for the spool carrying a given tag UID.
    ///
    /// First match wins; a duplicate UID is reported when the snapshot
    /// is applied, not resolved here.
    pub fn spool_by_tag(&self, uid: &str) -> Option<Arc<Spool>> {
        self.spools_snapshot()
            .iter()
            .find(|spool| spool.tag_uid.as_deref() == Some(uid))
            .map(Arc::clone)
    }

    pub fn printer_status(&self, id: i64) -> Option<Arc<PrinterStatus>> {
        self.printers.get(&id.to_string())
    }

    /// A printer's queue items, ordered by queue position.
    pub fn queue_for_printer(&self, printer_id: i64) -> Vec<Arc<QueueItem>> {
        let mut items: Vec<Arc<QueueItem>> = self
            .queue_snapshot()
            .iter()
            .filter(|item| item.printer_id == Some(printer_id))
            .map(Arc::clone)
            .collect();
        items.sort_by_key(|item| item.position);
        items
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn spool_count(&self) -> usize {
        self.spools.len()
    }

    pub fn printer_count(&self) -> usize {
        self.printers.len()
    }

    pub fn queue_item_count(&self) -> usize {
        self.queue_items.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_spools(&self) -> EntityStream<Spool> {
        EntityStream::new(self.spools.subscribe())
    }

    pub fn subscribe_printers(&self) -> EntityStream<PrinterStatus> {
        EntityStream::new(self.printers.subscribe())
    }

    pub fn subscribe_queue(&self) -> EntityStream<QueueItem> {
        EntityStream::new(self.queue_items.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

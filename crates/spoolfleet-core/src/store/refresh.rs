// ── Refresh application logic ──
//
// Applies bulk snapshots fetched from the backend into the DataStore.
// Polling supersedes: each apply is a full replace of its collection
// (or, for queues, of one printer's slice of it).

use std::collections::HashMap;

use chrono::Utc;
use tracing::warn;

use super::DataStore;
use crate::model::{PrinterStatus, QueueItem, Spool};

impl DataStore {
    /// Replace the spool inventory with a fresh snapshot.
    ///
    /// Duplicate tag UIDs are a data-integrity condition: they are
    /// reported here (once per refresh) and left in place, matching
    /// keeps its first-wins behavior.
    pub fn apply_spools(&self, spools: Vec<Spool>) {
        let mut seen: HashMap<&str, i64> = HashMap::new();
        for spool in &spools {
            if let Some(uid) = spool.tag_uid.as_deref() {
                if let Some(&other) = seen.get(uid) {
                    warn!(
                        uid,
                        spool_a = other,
                        spool_b = spool.id,
                        "two spools share a tag UID; matching will use the first"
                    );
                } else {
                    seen.insert(uid, spool.id);
                }
            }
        }

        self.spools
            .replace_all(spools.into_iter().map(|s| (s.id.to_string(), s)));
    }

    /// Upsert a single spool, e.g. the write-back after a weight sync.
    pub fn apply_spool(&self, spool: Spool) {
        self.spools.upsert(spool.id.to_string(), spool);
    }

    /// Replace all printer statuses with a fresh snapshot.
    pub fn apply_printer_statuses(&self, statuses: Vec<PrinterStatus>) {
        self.printers
            .replace_all(statuses.into_iter().map(|p| (p.id.to_string(), p)));
    }

    /// Upsert a single printer's status after a targeted refresh.
    pub fn apply_printer_status(&self, status: PrinterStatus) {
        self.printers.upsert(status.id.to_string(), status);
    }

    /// Replace one printer's queue slice, leaving other printers' items
    /// untouched.
    pub fn apply_queue(&self, printer_id: i64, items: Vec<QueueItem>) {
        self.queue_items.retain_and_upsert(
            |item| item.printer_id != Some(printer_id),
            items.into_iter().map(|i| (i.id.to_string(), i)),
        );
    }

    /// Stamp the completion of a full refresh cycle.
    pub fn mark_refreshed(&self) {
        let _ = self.last_full_refresh.send(Some(Utc::now()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::QueueStatus;

    fn spool(id: i64, uid: Option<&str>) -> Spool {
        Spool {
            id,
            tag_uid: uid.map(Into::into),
            material: "PLA".into(),
            subtype: None,
            color_name: None,
            rgba_hex: None,
            brand: None,
            label_weight_g: None,
            core_weight_g: None,
            weight_used_g: None,
            archived: false,
            updated_at: None,
        }
    }

    fn queue_item(id: i64, printer_id: i64, position: i32) -> QueueItem {
        QueueItem {
            id,
            printer_id: Some(printer_id),
            name: None,
            required_filament_types: vec![],
            filament_overrides: vec![],
            position,
            status: QueueStatus::Pending,
        }
    }

    #[test]
    fn apply_spools_is_a_full_replace() {
        let store = DataStore::new();
        store.apply_spools(vec![spool(1, None), spool(2, Some("AAA"))]);
        assert_eq!(store.spool_count(), 2);

        store.apply_spools(vec![spool(3, Some("AAA"))]);
        assert_eq!(store.spool_count(), 1);
        assert!(store.spool(1).is_none());
        assert_eq!(store.spool_by_tag("AAA").unwrap().id, 3);
    }

    #[test]
    fn apply_queue_only_touches_one_printer() {
        let store = DataStore::new();
        store.apply_queue(1, vec![queue_item(10, 1, 0), queue_item(11, 1, 1)]);
        store.apply_queue(2, vec![queue_item(20, 2, 0)]);
        assert_eq!(store.queue_item_count(), 3);

        // Refresh printer 1's queue: item 11 finished and disappeared
        store.apply_queue(1, vec![queue_item(10, 1, 0)]);
        assert_eq!(store.queue_item_count(), 2);
        assert_eq!(store.queue_for_printer(2).len(), 1);
    }

    #[test]
    fn queue_for_printer_orders_by_position() {
        let store = DataStore::new();
        store.apply_queue(
            1,
            vec![queue_item(12, 1, 2), queue_item(10, 1, 0), queue_item(11, 1, 1)],
        );

        let ids: Vec<i64> = store.queue_for_printer(1).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn mark_refreshed_sets_data_age() {
        let store = DataStore::new();
        assert!(store.data_age().is_none());
        store.mark_refreshed();
        assert!(store.data_age().is_some());
    }
}

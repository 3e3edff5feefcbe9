// ── Generic reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based
// change notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A lock-free, reactive collection for a single entity type.
///
/// Uses `DashMap` for O(1) concurrent lookups and `watch` channels
/// for push-based change notification. Every mutation bumps a version
/// counter and rebuilds the snapshot that subscribers receive.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    /// Primary storage, keyed by the entity's string id.
    by_key: DashMap<String, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, entity: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Look up an entity by its key.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Replace the entire collection in one mutation (one snapshot
    /// rebuild, one version bump).
    pub(crate) fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, T)>,
    {
        self.by_key.clear();
        for (key, entity) in entries {
            self.by_key.insert(key, Arc::new(entity));
        }
        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Remove every entity the predicate rejects, then upsert the given
    /// entries. Used for partial refreshes (e.g. one printer's queue).
    pub(crate) fn retain_and_upsert<I>(&self, keep: impl Fn(&T) -> bool, entries: I)
    where
        I: IntoIterator<Item = (String, T)>,
    {
        self.by_key.retain(|_, v| keep(v));
        for (key, entity) in entries {
            self.by_key.insert(key, Arc::new(entity));
        }
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_returns_true_for_new_key() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.upsert("key1".into(), "hello".into()));
        assert!(!col.upsert("key1".into(), "world".into()));
        assert_eq!(*col.get("key1").unwrap(), "world");
    }

    #[test]
    fn remove_returns_removed_entity() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert("key1".into(), "hello".into());

        assert_eq!(*col.remove("key1").unwrap(), "hello");
        assert!(col.get("key1").is_none());
        assert!(col.remove("key1").is_none());
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.snapshot().is_empty());

        col.upsert("a".into(), "x".into());
        col.upsert("b".into(), "y".into());
        assert_eq!(col.snapshot().len(), 2);
    }

    #[test]
    fn replace_all_swaps_contents() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert("old".into(), "x".into());

        col.replace_all([("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())]);

        assert!(col.get("old").is_none());
        assert_eq!(col.len(), 2);
        assert_eq!(*col.get("a").unwrap(), "1");
    }

    #[test]
    fn retain_and_upsert_is_a_partial_replace() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert("keep".into(), "k".into());
        col.upsert("drop".into(), "d".into());

        col.retain_and_upsert(|v| v == "k", [("new".to_owned(), "n".to_owned())]);

        assert!(col.get("keep").is_some());
        assert!(col.get("drop").is_none());
        assert!(col.get("new").is_some());
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let col: EntityCollection<String> = EntityCollection::new();
        let mut rx = col.subscribe();

        col.upsert("a".into(), "x".into());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bounded, newest-first store for live alerts.
//!
//! The store is the client-side model behind the live feed panel: a
//! ring of the most recent alerts plus a session counter of everything
//! seen since the dashboard came up. The ring drops its oldest entry
//! once full; the counter keeps counting, so the two are allowed to
//! diverge by design of the backend protocol.
//!
//! Every mutation bumps a [`watch`] revision so views can re-render
//! without polling. Lock poisoning is treated as fatal.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sentinel_alert_models::Alert;
use tokio::sync::watch;

/// How many alerts the ring keeps before dropping the oldest.
pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug)]
struct Inner {
    ring: VecDeque<Alert>,
    total: u64,
}

/// Shared handle to the alert ring. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct AlertStore {
    inner: Arc<RwLock<Inner>>,
    revision: Arc<watch::Sender<u64>>,
    capacity: usize,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertStore {
    /// Creates a store holding up to [`DEFAULT_CAPACITY`] alerts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                ring: VecDeque::with_capacity(capacity),
                total: 0,
            })),
            revision: Arc::new(revision),
            capacity,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("alert store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("alert store lock poisoned")
    }

    /// Prepends `alert` and bumps the session counter.
    ///
    /// The newest alert always sits at index 0. Once the ring is full
    /// the oldest entry falls off the back.
    pub fn insert(&self, alert: Alert) {
        log::trace!(
            "insert: kind={} pincode={} id={}",
            alert.kind,
            alert.pincode,
            alert.id
        );
        {
            let mut inner = self.write();
            inner.ring.push_front(alert);
            inner.ring.truncate(self.capacity);
            inner.total += 1;
        }
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Overwrites the session counter with an authoritative total from
    /// the backend.
    pub fn set_total(&self, total: u64) {
        log::debug!("set_total: {total}");
        self.write().total = total;
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Snapshot of the ring, newest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        self.read().ring.iter().cloned().collect()
    }

    /// The `n` most recent alerts, newest first.
    #[must_use]
    pub fn latest(&self, n: usize) -> Vec<Alert> {
        self.read().ring.iter().take(n).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().ring.is_empty()
    }

    /// Alerts seen this session. Unlike [`Self::len`] this is not
    /// capped by the ring capacity, and [`Self::set_total`] may move it
    /// independently of any insert.
    #[must_use]
    pub fn total_today(&self) -> u64 {
        self.read().total
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Monotonic revision, bumped on every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribes to revision bumps so a view can await the next
    /// change instead of polling.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use sentinel_alert_models::{Alert, PushEvent};

    use super::AlertStore;

    fn alert(message: &str) -> Alert {
        Alert::from_event(PushEvent {
            kind: "Phantom Village".to_string(),
            pincode: 110_032,
            message: message.to_string(),
        })
    }

    #[test]
    fn starts_empty() {
        let store = AlertStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.total_today(), 0);
        assert_eq!(store.revision(), 0);
        assert!(store.alerts().is_empty());
    }

    #[test]
    fn newest_alert_sits_at_the_front() {
        let store = AlertStore::new();
        store.insert(alert("first"));
        store.insert(alert("second"));
        store.insert(alert("third"));

        let alerts = store.alerts();
        assert_eq!(alerts[0].message, "third");
        assert_eq!(alerts[1].message, "second");
        assert_eq!(alerts[2].message, "first");
    }

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let store = AlertStore::with_capacity(3);
        for message in ["a", "b", "c", "d", "e"] {
            store.insert(alert(message));
        }

        assert_eq!(store.len(), 3);
        let messages: Vec<_> = store.alerts().into_iter().map(|a| a.message).collect();
        assert_eq!(messages, ["e", "d", "c"]);
        assert_eq!(store.total_today(), 5);
    }

    #[test]
    fn session_counter_moves_independently_of_the_ring() {
        let store = AlertStore::with_capacity(2);
        store.insert(alert("a"));
        store.insert(alert("b"));
        assert_eq!(store.total_today(), 2);

        store.set_total(120);
        assert_eq!(store.total_today(), 120);
        assert_eq!(store.len(), 2);

        store.insert(alert("c"));
        assert_eq!(store.total_today(), 121);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn latest_takes_from_the_newest_end() {
        let store = AlertStore::new();
        for message in ["a", "b", "c"] {
            store.insert(alert(message));
        }
        let messages: Vec<_> = store.latest(2).into_iter().map(|a| a.message).collect();
        assert_eq!(messages, ["c", "b"]);
    }

    #[test]
    fn every_mutation_bumps_the_revision() {
        let store = AlertStore::new();
        store.insert(alert("a"));
        store.set_total(7);
        store.insert(alert("b"));
        assert_eq!(store.revision(), 3);
    }

    #[tokio::test]
    async fn watchers_wake_on_insert() {
        let store = AlertStore::new();
        let mut rx = store.watch();

        store.insert(alert("a"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);

        store.set_total(9);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 2);
    }
}

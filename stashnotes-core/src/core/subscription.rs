//! Live search subscriptions and their cached results.
//!
//! Each subscription is a standing query with the last result its subscriber
//! was shown. After every mutation the registry recomputes each distinct
//! query once against a single consistent view of the repository and pushes
//! the new result only to subscriptions whose cached value changed.

use crate::core::search::{search, MatchMode, SearchQuery};
use crate::{Note, Repository};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Handle identifying one live subscription.
///
/// IDs are never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a live search.
///
/// Yields a fresh ordered result each time a mutation changes it. The stream
/// ends (all receive methods return `None`) once the subscription is
/// unsubscribed or the store is dropped. Dropping a `Subscription`
/// deregisters it on the spot, so abandoned searches cost nothing on later
/// mutations.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    query: String,
    updates: Receiver<Vec<Note>>,
    registry: Weak<EntryMap>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Blocks until the next update arrives or the stream ends.
    pub fn recv(&self) -> Option<Vec<Note>> {
        self.updates.recv().ok()
    }

    /// Returns the next pending update without blocking.
    pub fn try_recv(&self) -> Option<Vec<Note>> {
        match self.updates.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<Note>> {
        match self.updates.recv_timeout(timeout) {
            Ok(update) => Some(update),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains every pending update and returns the newest one.
    pub fn latest(&self) -> Option<Vec<Note>> {
        self.updates.try_iter().last()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(entries) = self.registry.upgrade() {
            lock(&entries).remove(&self.id);
        }
    }
}

impl Iterator for Subscription {
    type Item = Vec<Note>;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

struct Entry {
    query: SearchQuery,
    cached: Vec<Note>,
    sender: Sender<Vec<Note>>,
}

type EntryMap = Mutex<HashMap<SubscriptionId, Entry>>;

// Entries are replaced whole, so a poisoned registry is still consistent.
fn lock(entries: &EntryMap) -> MutexGuard<'_, HashMap<SubscriptionId, Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observer registry keyed by subscription, grouped by query text on recompute.
pub struct SubscriptionRegistry {
    entries: Arc<EntryMap>,
    next_id: AtomicU64,
    mode: MatchMode,
}

impl SubscriptionRegistry {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            mode,
        }
    }

    /// Registers a live query and returns its current result with the stream.
    ///
    /// The initial result is computed while the registry is locked, so a
    /// mutation that completes concurrently is either already reflected in it
    /// or will be delivered through the stream.
    pub fn subscribe(&self, repository: &Repository, text: &str) -> (Vec<Note>, Subscription) {
        let query = SearchQuery::new(text, self.mode);
        let (sender, updates) = mpsc::channel();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut entries = self.lock_entries();
        let initial = repository.with_notes(|notes| search(notes.values(), &query));
        entries.insert(
            id,
            Entry {
                query,
                cached: initial.clone(),
                sender,
            },
        );
        drop(entries);

        log::debug!("{id} subscribed to {text:?}");
        let subscription = Subscription {
            id,
            query: text.to_string(),
            updates,
            registry: Arc::downgrade(&self.entries),
        };
        (initial, subscription)
    }

    /// Deregisters `id`. Returns whether it was still live.
    ///
    /// No update is delivered to `id` after this returns.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.lock_entries().remove(&id).is_some();
        if removed {
            log::debug!("{id} unsubscribed");
        }
        removed
    }

    /// Recomputes every live query and pushes changed results.
    ///
    /// Returns the number of subscriptions that received an update. An entry
    /// whose receiver is already gone is removed.
    pub fn notify_mutation(&self, repository: &Repository) -> usize {
        let mut entries = self.lock_entries();
        if entries.is_empty() {
            return 0;
        }

        let mut fresh: HashMap<String, Vec<Note>> = HashMap::new();
        repository.with_notes(|notes| {
            for entry in entries.values() {
                fresh
                    .entry(entry.query.text().to_string())
                    .or_insert_with(|| search(notes.values(), &entry.query));
            }
        });

        let mut pushed = 0;
        let mut dead = Vec::new();
        for (id, entry) in entries.iter_mut() {
            let Some(result) = fresh.get(entry.query.text()) else {
                continue;
            };
            if *result == entry.cached {
                continue;
            }
            if entry.sender.send(result.clone()).is_err() {
                dead.push(*id);
                continue;
            }
            entry.cached = result.clone();
            pushed += 1;
        }

        for id in dead {
            log::warn!("{id} has no receiver left; removing it");
            entries.remove(&id);
        }

        log::debug!(
            "recomputed {} queries for {} subscriptions, pushed {pushed}",
            fresh.len(),
            entries.len()
        );
        pushed
    }

    /// Returns the last result delivered to `id`, if it is live.
    pub fn cached(&self, id: SubscriptionId) -> Option<Vec<Note>> {
        self.lock_entries().get(&id).map(|entry| entry.cached.clone())
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Entry>> {
        lock(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeletePolicy, MemoryBackend};

    fn setup() -> (Repository, SubscriptionRegistry) {
        let repo = Repository::open(Box::new(MemoryBackend::new()), DeletePolicy::Strict).unwrap();
        (repo, SubscriptionRegistry::new(MatchMode::IgnoreCase))
    }

    #[test]
    fn test_subscribe_returns_current_result() {
        let (repo, registry) = setup();
        repo.create("Milk".to_string(), "buy 2%".to_string()).unwrap();
        repo.create("Work".to_string(), "finish report".to_string()).unwrap();

        let (initial, sub) = registry.subscribe(&repo, "milk");
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].title, "Milk");
        assert_eq!(registry.cached(sub.id()), Some(initial));
        assert_eq!(sub.query(), "milk");
    }

    #[test]
    fn test_changed_result_is_pushed_once() {
        let (repo, registry) = setup();
        let (_, sub) = registry.subscribe(&repo, "milk");

        repo.create("Milk".to_string(), String::new()).unwrap();
        assert_eq!(registry.notify_mutation(&repo), 1);

        let update = sub.try_recv().unwrap();
        assert_eq!(update.len(), 1);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_unchanged_result_is_not_pushed() {
        let (repo, registry) = setup();
        let (_, sub) = registry.subscribe(&repo, "milk");

        repo.create("Work".to_string(), "report".to_string()).unwrap();
        assert_eq!(registry.notify_mutation(&repo), 0);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_shared_query_text_updates_every_subscriber() {
        let (repo, registry) = setup();
        let (_, a) = registry.subscribe(&repo, "x");
        let (_, b) = registry.subscribe(&repo, "x");
        let (_, c) = registry.subscribe(&repo, "y");

        repo.create("x".to_string(), String::new()).unwrap();
        assert_eq!(registry.notify_mutation(&repo), 2);
        assert!(a.try_recv().is_some());
        assert!(b.try_recv().is_some());
        assert!(c.try_recv().is_none());
    }

    #[test]
    fn test_unsubscribe_stops_updates_and_ends_stream() {
        let (repo, registry) = setup();
        let (_, sub) = registry.subscribe(&repo, "");

        assert!(registry.unsubscribe(sub.id()));
        assert!(!registry.unsubscribe(sub.id()));

        repo.create("anything".to_string(), String::new()).unwrap();
        assert_eq!(registry.notify_mutation(&repo), 0);
        assert!(sub.recv().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_stream_is_deregistered() {
        let (repo, registry) = setup();
        let (_, sub) = registry.subscribe(&repo, "");
        assert_eq!(registry.len(), 1);
        drop(sub);
        assert_eq!(registry.len(), 0);

        repo.create("anything".to_string(), String::new()).unwrap();
        assert_eq!(registry.notify_mutation(&repo), 0);
    }

    #[test]
    fn test_abandoned_searches_do_not_accumulate() {
        let (repo, registry) = setup();
        for text in ["z", "zz", "zzz", "zzzz"] {
            let (_, sub) = registry.subscribe(&repo, text);
            drop(sub);
        }

        for i in 0..5 {
            repo.create(format!("note {i}"), "body".to_string()).unwrap();
            registry.notify_mutation(&repo);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_after_registry_is_gone() {
        let (repo, registry) = setup();
        let (_, sub) = registry.subscribe(&repo, "");
        drop(registry);
        assert!(sub.recv().is_none());
        drop(sub);
    }

    #[test]
    fn test_latest_drains_to_newest() {
        let (repo, registry) = setup();
        let (_, sub) = registry.subscribe(&repo, "");

        repo.create("one".to_string(), String::new()).unwrap();
        registry.notify_mutation(&repo);
        repo.create("two".to_string(), String::new()).unwrap();
        registry.notify_mutation(&repo);

        let latest = sub.latest().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let (repo, registry) = setup();
        let (_, a) = registry.subscribe(&repo, "");
        let (_, b) = registry.subscribe(&repo, "");
        assert_ne!(a.id(), b.id());
        assert!(a.id().to_string().starts_with("sub-"));
    }
}

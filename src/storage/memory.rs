//! In-process durable store shared between contexts
//!
//! A [`MemoryBackend`] plays the role of the shared storage; each call to
//! [`MemoryBackend::context`] hands out a [`MemoryStore`] standing for one
//! execution context (a builder tab, a filler tab, ...). A context stops
//! receiving changes once its last handle is dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::traits::{DurableStore, ExternalChange, StoreError};
use super::CHANGE_CHANNEL_CAPACITY;

#[derive(Debug, Default)]
struct Contexts {
    next_id: usize,
    senders: BTreeMap<usize, broadcast::Sender<ExternalChange>>,
}

#[derive(Debug, Default)]
struct Shared {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    contexts: Mutex<Contexts>,
}

impl Shared {
    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn contexts(&self) -> MutexGuard<'_, Contexts> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Notify every context except `origin`.
    ///
    /// Callers hold the entries lock so notifications follow write order.
    fn notify(&self, origin: Option<usize>, change: ExternalChange) {
        for (id, sender) in &self.contexts().senders {
            if Some(*id) != origin {
                // No receivers is fine: the context is not listening
                let _ = sender.send(change.clone());
            }
        }
    }
}

/// Shared storage behind any number of contexts
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new execution context on this backend
    pub fn context(&self) -> MemoryStore {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut contexts = self.shared.contexts();
        let id = contexts.next_id;
        contexts.next_id += 1;
        contexts.senders.insert(id, sender.clone());
        MemoryStore {
            context: Arc::new(Context {
                shared: Arc::clone(&self.shared),
                id,
                sender,
            }),
        }
    }

    /// Number of contexts still registered
    pub fn context_count(&self) -> usize {
        self.shared.contexts().senders.len()
    }

    /// Remove a key from outside every context, notifying all of them
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.shared.entries()?;
        entries.remove(key);
        self.shared.notify(
            None,
            ExternalChange {
                key: key.to_string(),
                value: None,
            },
        );
        Ok(())
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<_> = self.shared.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug)]
struct Context {
    shared: Arc<Shared>,
    id: usize,
    sender: broadcast::Sender<ExternalChange>,
}

impl Drop for Context {
    fn drop(&mut self) {
        self.shared.contexts().senders.remove(&self.id);
    }
}

/// One execution context's handle on a [`MemoryBackend`]
///
/// Clones share the context.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    context: Arc<Context>,
}

impl MemoryStore {
    /// A store with a private backend, for single-context use
    pub fn standalone() -> Self {
        MemoryBackend::new().context()
    }

    pub fn context_id(&self) -> usize {
        self.context.id
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.context.shared.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let shared = &self.context.shared;
        let mut entries = shared.entries()?;
        entries.insert(key.to_string(), value.clone());
        shared.notify(
            Some(self.context.id),
            ExternalChange {
                key: key.to_string(),
                value: Some(value),
            },
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ExternalChange> {
        self.context.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let store = MemoryStore::standalone();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_contexts_share_entries() {
        let backend = MemoryBackend::new();
        let a = backend.context();
        let b = backend.context();
        a.set("k", b"v".to_vec()).await.unwrap();
        assert_eq!(b.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(backend.keys().unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_own_writes_do_not_notify_self() {
        let backend = MemoryBackend::new();
        let a = backend.context();
        let b = backend.context();
        let mut a_changes = a.subscribe();
        let mut b_changes = b.subscribe();

        a.set("k", b"1".to_vec()).await.unwrap();

        assert!(matches!(a_changes.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(
            b_changes.try_recv().unwrap(),
            ExternalChange {
                key: "k".to_string(),
                value: Some(b"1".to_vec()),
            }
        );
    }

    #[tokio::test]
    async fn test_backend_remove_notifies_everyone() {
        let backend = MemoryBackend::new();
        let a = backend.context();
        let mut changes = a.subscribe();
        a.set("k", b"1".to_vec()).await.unwrap();
        backend.remove("k").unwrap();
        assert_eq!(changes.try_recv().unwrap().value, None);
        assert_eq!(a.get("k").await.unwrap(), None);
    }

    #[test]
    fn test_context_ids_are_distinct() {
        let backend = MemoryBackend::new();
        assert_ne!(backend.context().context_id(), backend.context().context_id());
    }

    #[test]
    fn test_dropped_contexts_are_unregistered() {
        let backend = MemoryBackend::new();
        let kept = backend.context();
        let shared_handle = kept.clone();
        for _ in 0..10 {
            let _ = backend.context();
        }
        assert_eq!(backend.context_count(), 1);
        drop(kept);
        assert_eq!(backend.context_count(), 1);
        drop(shared_handle);
        assert_eq!(backend.context_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_notify_in_write_order() {
        let backend = MemoryBackend::new();
        let watcher = backend.context();
        let mut changes = watcher.subscribe();

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = backend.context();
                tokio::spawn(async move {
                    for i in 0..10 {
                        store.set("k", format!("{w}-{i}").into_bytes()).await.unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let mut last = None;
        while let Ok(change) = changes.try_recv() {
            last = change.value;
        }
        assert_eq!(last, watcher.get("k").await.unwrap());
    }
}

// src/session/store.rs
// Bounded in-memory session map, least recently used evicted first

use super::Session;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

pub struct SessionStore {
    sessions: Mutex<LruCache<Uuid, SessionHandle>>,
    capacity: NonZeroUsize,
}

impl SessionStore {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    pub fn create(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(tokio::sync::Mutex::new(session));

        let evicted = self.sessions.lock().push(id, handle.clone());
        if let Some((old_id, _)) = evicted {
            info!(session = %old_id, "Evicted least recently used session");
        }
        debug!(session = %id, "Created session");
        (id, handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.lock().pop(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new(4);
        let (id, _) = store.create();

        assert!(store.get(&id).is_some());
        assert!(store.get(&Uuid::new_v4()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(4);
        let (id, _) = store.create();

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_lru_eviction_respects_access_order() {
        let store = SessionStore::new(2);
        let (first, _) = store.create();
        let (second, _) = store.create();

        // touch first so second becomes the eviction candidate
        assert!(store.get(&first).is_some());
        let (third, _) = store.create();

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_some());
        assert!(store.get(&second).is_none());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let store = SessionStore::new(0);
        assert_eq!(store.capacity(), 1);
    }

    #[tokio::test]
    async fn test_handle_shares_state() {
        let store = SessionStore::new(2);
        let (id, handle) = store.create();

        let again = store.get(&id).unwrap();
        assert!(Arc::ptr_eq(&handle, &again));
        assert_eq!(again.lock().await.id(), id);
    }
}

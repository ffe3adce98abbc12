//! Identity -> stream-handle table, safe under unbounded concurrent callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identifies one registration. Handed back by [`ConnectionRegistry::register`]
/// and required by `unregister`, so a stale disconnect callback can never
/// evict a newer connection registered under the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionId(u64);

struct Entry<H> {
    id: ConnectionId,
    handle: H,
}

/// Concurrency-safe table mapping a recipient identity to the write handle
/// of its currently open stream.
///
/// One mutex guards the map; every operation is O(1) and holds the lock for
/// map access only. Registration is last-register-wins: a newer connection
/// silently replaces a stale one.
pub struct ConnectionRegistry<H> {
    entries: Mutex<HashMap<String, Entry<H>>>,
    next_id: AtomicU64,
}

impl<H> Default for ConnectionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ConnectionRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handle` under `identity`, replacing any prior entry.
    pub fn register(&self, identity: &str, handle: H) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        entries.insert(identity.to_owned(), Entry { id, handle });
        id
    }

    /// Remove the entry for `identity`, but only while it still belongs to
    /// `id`. Idempotent: a repeated or stale call is a no-op. Returns whether
    /// an entry was removed.
    pub fn unregister(&self, identity: &str, id: ConnectionId) -> bool {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        match entries.get(identity) {
            Some(entry) if entry.id == id => {
                entries.remove(identity);
                true
            }
            _ => false,
        }
    }

    /// Number of currently registered identities.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> ConnectionRegistry<H> {
    /// Non-blocking read of the live handle for `identity`, if any.
    pub fn lookup(&self, identity: &str) -> Option<H> {
        let entries = self.entries.lock().expect("registry lock poisoned");
        entries.get(identity).map(|entry| entry.handle.clone())
    }
}

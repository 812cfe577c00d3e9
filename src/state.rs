//! # Shared Runtime State
//!
//! The only state that crosses connection boundaries lives here:
//! the global segment-ID counter and the live-connection registry.
//! Everything else (segment buffers, protocol state) is exclusively owned by
//! one connection task, so no further synchronization exists in the core.
//!
//! ## Thread Safety:
//! - **SegmentCounter**: an `AtomicU64`; the increment is the entire critical
//!   section, so IDs are unique and strictly increasing in assignment order
//!   across every connection.
//! - **ConnectionRegistry**: a `Mutex<HashMap>` mutated only on connect and
//!   disconnect. The lock is held for the insert/remove alone, never across
//!   I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Monotonic counter handing out segment IDs.
///
/// The counter is an explicit object passed into the listener at construction
/// rather than a process-wide global. It is seeded at startup (the history
/// scanner that re-reads past recordings from disk owns the seed value; a
/// fresh install seeds 0) and incremented only when a segment is finalized,
/// so IDs are assigned in finalize order, not in connect order.
#[derive(Debug)]
pub struct SegmentCounter {
    next_id: AtomicU64,
}

impl SegmentCounter {
    /// Create a counter that will hand out IDs starting at `seed + 1`.
    pub fn new(seed: u64) -> Self {
        Self {
            next_id: AtomicU64::new(seed),
        }
    }

    /// Claim the next segment ID.
    pub fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Registry of currently connected senders, keyed by an internal connection
/// number and holding the remote source identifier.
///
/// The registry exists for bookkeeping (active-connection counts, source
/// listing for diagnostics); closing connections on shutdown goes through the
/// listener's shutdown signal, not through the registry.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<u64, String>>,
    next_key: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, returning its registry key.
    pub fn insert(&self, source: &str) -> u64 {
        let key = self.next_key.fetch_add(1, Ordering::SeqCst);
        let mut connections = self.connections.lock().unwrap();
        connections.insert(key, source.to_string());
        key
    }

    /// Remove a connection on disconnect. Removing an unknown key is a no-op.
    pub fn remove(&self, key: u64) {
        let mut connections = self.connections.lock().unwrap();
        connections.remove(&key);
    }

    /// Number of currently live connections.
    pub fn active_count(&self) -> usize {
        let connections = self.connections.lock().unwrap();
        connections.len()
    }

    /// Source identifiers of all live connections. The listener logs these
    /// when a stop catches connections still open.
    pub fn sources(&self) -> Vec<String> {
        let connections = self.connections.lock().unwrap();
        connections.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// IDs start after the seed and increase by one.
    #[test]
    fn test_counter_seeding() {
        let counter = SegmentCounter::new(41);
        assert_eq!(counter.next(), 42);
        assert_eq!(counter.next(), 43);
    }

    /// IDs claimed from many threads are pairwise distinct.
    #[test]
    fn test_counter_unique_across_threads() {
        let counter = Arc::new(SegmentCounter::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                (0..100).map(|_| counter.next()).collect::<Vec<u64>>()
            }));
        }

        let mut all_ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all_ids.sort_unstable();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 800);
    }

    #[test]
    fn test_registry_insert_remove() {
        let registry = ConnectionRegistry::new();
        let a = registry.insert("10.0.0.1");
        let b = registry.insert("10.0.0.2");
        assert_eq!(registry.active_count(), 2);

        registry.remove(a);
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.sources(), vec!["10.0.0.2".to_string()]);

        registry.remove(b);
        registry.remove(b); // double remove is harmless
        assert_eq!(registry.active_count(), 0);
    }
}

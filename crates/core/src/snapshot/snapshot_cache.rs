//! Single-writer cache for the latest snapshot.
//!
//! Replacement is atomic and wholesale, so a render pass sees either the old
//! or the new snapshot in full, never a mix. The cache also owns the request
//! sequence counter: responses from requests dispatched earlier than the last
//! committed one are discarded, which closes the stale-overwrite race between
//! overlapping polls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, warn};

use super::Snapshot;

/// Outcome of a [`SnapshotCache::replace`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The snapshot was committed.
    Applied { seq: u64 },
    /// The response arrived after a newer one had already been committed.
    StaleDiscarded { seq: u64, committed: u64 },
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<Snapshot>>,
    committed_seq: u64,
}

/// Holds exactly the most recent snapshot, or nothing.
///
/// Single writer (the fetch-success path), many readers. No eviction.
#[derive(Default)]
pub struct SnapshotCache {
    state: RwLock<CacheState>,
    dispatch_seq: AtomicU64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the sequence number for a request about to be dispatched.
    /// Strictly increasing across the cache's lifetime.
    pub fn next_seq(&self) -> u64 {
        self.dispatch_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The current snapshot, if any.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.state.read().expect("snapshot cache poisoned").snapshot.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state
            .read()
            .expect("snapshot cache poisoned")
            .snapshot
            .is_none()
    }

    /// Atomically replaces the cached snapshot.
    ///
    /// `seq` must be the value issued by [`next_seq`](Self::next_seq) when
    /// the request was dispatched. A response whose sequence is not newer
    /// than the last committed one is discarded.
    pub fn replace(&self, seq: u64, snapshot: Snapshot) -> ReplaceOutcome {
        let mut state = self.state.write().expect("snapshot cache poisoned");
        if seq <= state.committed_seq {
            warn!(
                "discarding stale snapshot response (seq {} <= committed {})",
                seq, state.committed_seq
            );
            return ReplaceOutcome::StaleDiscarded {
                seq,
                committed: state.committed_seq,
            };
        }
        debug!("committing snapshot seq {}", seq);
        state.snapshot = Some(Arc::new(snapshot));
        state.committed_seq = seq;
        ReplaceOutcome::Applied { seq }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn snapshot(sales: rust_decimal::Decimal) -> Snapshot {
        Snapshot {
            total_sales: sales,
            total_received: sales,
            difference: dec!(0),
            alert_count: 0,
            acquirers: BTreeMap::new(),
            brands: None,
            detail: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_until_first_commit() {
        let cache = SnapshotCache::new();
        assert!(cache.is_empty());
        assert!(cache.get().is_none());

        let seq = cache.next_seq();
        assert_eq!(cache.replace(seq, snapshot(dec!(1))), ReplaceOutcome::Applied { seq });
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let cache = SnapshotCache::new();
        cache.replace(cache.next_seq(), snapshot(dec!(1)));
        cache.replace(cache.next_seq(), snapshot(dec!(2)));
        assert_eq!(cache.get().unwrap().total_sales, dec!(2));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let cache = SnapshotCache::new();
        let older = cache.next_seq();
        let newer = cache.next_seq();

        // The newer request's response lands first.
        assert_eq!(
            cache.replace(newer, snapshot(dec!(2))),
            ReplaceOutcome::Applied { seq: newer }
        );
        // The slow older response must not overwrite it.
        assert_eq!(
            cache.replace(older, snapshot(dec!(1))),
            ReplaceOutcome::StaleDiscarded {
                seq: older,
                committed: newer
            }
        );
        assert_eq!(cache.get().unwrap().total_sales, dec!(2));
    }

    #[test]
    fn test_sequence_numbers_are_strictly_increasing() {
        let cache = SnapshotCache::new();
        let a = cache.next_seq();
        let b = cache.next_seq();
        assert!(b > a);
    }

    #[test]
    fn test_readers_share_the_same_snapshot() {
        let cache = SnapshotCache::new();
        cache.replace(cache.next_seq(), snapshot(dec!(5)));
        let a = cache.get().unwrap();
        let b = cache.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

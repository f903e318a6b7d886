//! Per-partner sequence generation
//!
//! Issues the strictly increasing per-partner sequence number assigned at
//! acceptance. The counter map is the only mutable state on the critical
//! path; per-key locking makes the read-modify-write atomic per partner
//! while keeping partners independent of each other.
//!
//! Durability is a debounced JSON mapping `{partner: counter}`. The
//! in-memory increment is never deferred (the number is live before `next`
//! returns) and a restart resumes from the last persisted value: gaps are
//! tolerated after an unclean shutdown, duplicates never happen.

use dashmap::DashMap;
use persistence::{DebouncedFlusher, JsonSnapshotStore, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace};
use types::partner::PartnerId;

/// Monotonic per-partner counters with optional debounced durability.
pub struct SequenceGenerator {
    counters: Arc<DashMap<PartnerId, u64>>,
    flusher: Option<DebouncedFlusher>,
}

impl SequenceGenerator {
    /// Counters without a backing file; state dies with the process.
    pub fn in_memory() -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
            flusher: None,
        }
    }

    /// Open file-backed counters, resuming from the last persisted values.
    pub fn open(store: JsonSnapshotStore, debounce: Duration) -> Result<Self, StoreError> {
        let loaded: BTreeMap<PartnerId, u64> = store.load()?.unwrap_or_default();
        info!(
            path = %store.path().display(),
            partners = loaded.len(),
            "sequence counters loaded"
        );

        let counters = Arc::new(DashMap::new());
        for (partner, value) in loaded {
            counters.insert(partner, value);
        }

        let snapshot_source = Arc::clone(&counters);
        let flusher = DebouncedFlusher::spawn("sequences", debounce, move || {
            // BTreeMap keeps the file deterministic across flushes.
            let snapshot: BTreeMap<PartnerId, u64> = snapshot_source
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect();
            store.write(&snapshot)?;
            Ok(())
        });

        Ok(Self {
            counters,
            flusher: Some(flusher),
        })
    }

    /// Issue the next sequence number for a partner. The first issued number
    /// is 1. Concurrent callers for the same partner never observe the same
    /// value.
    pub fn next(&self, partner: PartnerId) -> u64 {
        let issued = {
            let mut entry = self.counters.entry(partner).or_insert(0);
            *entry += 1;
            *entry
        };
        trace!(partner = %partner, sequence = issued, "sequence issued");
        self.mark_dirty();
        issued
    }

    /// The last issued number for a partner, without advancing it.
    pub fn current(&self, partner: PartnerId) -> u64 {
        self.counters.get(&partner).map(|v| *v).unwrap_or(0)
    }

    /// Reset one partner's counter to 0. Test support.
    pub fn reset(&self, partner: PartnerId) {
        self.counters.insert(partner, 0);
        self.mark_dirty();
    }

    /// Reset every counter to 0. Test support.
    pub fn reset_all(&self) {
        for partner in PartnerId::ALL {
            self.counters.insert(partner, 0);
        }
        self.mark_dirty();
    }

    /// Write any pending counter snapshot now.
    pub fn flush(&self) {
        if let Some(flusher) = &self.flusher {
            flusher.flush();
        }
    }

    /// Message of the last failed snapshot write, if any. A failed write
    /// never blocks issuance; the in-memory counter stays authoritative.
    pub fn persist_error(&self) -> Option<String> {
        self.flusher.as_ref().and_then(|f| f.last_error())
    }

    fn mark_dirty(&self) {
        if let Some(flusher) = &self.flusher {
            flusher.mark_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_first_issued_number_is_one() {
        let sequences = SequenceGenerator::in_memory();
        assert_eq!(sequences.current(PartnerId::PartnerA), 0);
        assert_eq!(sequences.next(PartnerId::PartnerA), 1);
        assert_eq!(sequences.next(PartnerId::PartnerA), 2);
        assert_eq!(sequences.current(PartnerId::PartnerA), 2);
    }

    #[test]
    fn test_partners_are_independent() {
        let sequences = SequenceGenerator::in_memory();
        sequences.next(PartnerId::PartnerA);
        sequences.next(PartnerId::PartnerA);

        assert_eq!(sequences.next(PartnerId::PartnerB), 1);
        assert_eq!(sequences.current(PartnerId::PartnerA), 2);
    }

    #[test]
    fn test_current_does_not_advance() {
        let sequences = SequenceGenerator::in_memory();
        sequences.next(PartnerId::PartnerA);
        assert_eq!(sequences.current(PartnerId::PartnerA), 1);
        assert_eq!(sequences.current(PartnerId::PartnerA), 1);
        assert_eq!(sequences.next(PartnerId::PartnerA), 2);
    }

    #[test]
    fn test_reset() {
        let sequences = SequenceGenerator::in_memory();
        sequences.next(PartnerId::PartnerA);
        sequences.next(PartnerId::PartnerB);

        sequences.reset(PartnerId::PartnerA);
        assert_eq!(sequences.next(PartnerId::PartnerA), 1);
        assert_eq!(sequences.current(PartnerId::PartnerB), 1);

        sequences.reset_all();
        assert_eq!(sequences.current(PartnerId::PartnerB), 0);
    }

    #[test]
    fn test_concurrent_next_never_duplicates() {
        let sequences = Arc::new(SequenceGenerator::in_memory());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let sequences = Arc::clone(&sequences);
            handles.push(thread::spawn(move || {
                (0..250)
                    .map(|_| sequences.next(PartnerId::PartnerA))
                    .collect::<Vec<u64>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for issued in handle.join().unwrap() {
                assert!(seen.insert(issued), "sequence {issued} issued twice");
            }
        }

        assert_eq!(seen.len(), 1000);
        assert_eq!(sequences.current(PartnerId::PartnerA), 1000);
        assert_eq!(*seen.iter().max().unwrap(), 1000);
    }

    #[test]
    fn test_restart_resumes_from_persisted_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sequences.json");

        {
            let sequences = SequenceGenerator::open(
                JsonSnapshotStore::new(&path),
                Duration::from_millis(10),
            )
            .unwrap();
            sequences.next(PartnerId::PartnerA);
            sequences.next(PartnerId::PartnerA);
            sequences.next(PartnerId::PartnerB);
            sequences.flush();
        }

        let reopened = SequenceGenerator::open(
            JsonSnapshotStore::new(&path),
            Duration::from_millis(10),
        )
        .unwrap();
        assert_eq!(reopened.current(PartnerId::PartnerA), 2);
        assert_eq!(reopened.next(PartnerId::PartnerA), 3);
        assert_eq!(reopened.next(PartnerId::PartnerB), 2);
    }

    #[test]
    fn test_drop_drains_pending_persist() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sequences.json");

        {
            let sequences = SequenceGenerator::open(
                JsonSnapshotStore::new(&path),
                Duration::from_secs(60),
            )
            .unwrap();
            sequences.next(PartnerId::PartnerA);
            // No explicit flush; drop must drain the debounced write.
        }

        let reopened = SequenceGenerator::open(
            JsonSnapshotStore::new(&path),
            Duration::from_millis(10),
        )
        .unwrap();
        assert_eq!(reopened.current(PartnerId::PartnerA), 1);
    }

    #[test]
    fn test_persisted_file_shape() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sequences.json");

        let sequences = SequenceGenerator::open(
            JsonSnapshotStore::new(&path),
            Duration::from_millis(10),
        )
        .unwrap();
        sequences.next(PartnerId::PartnerA);
        sequences.flush();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["PARTNER_A"], 1);
    }
}

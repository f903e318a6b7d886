//! Error repository
//!
//! Mirror of the order store limited to rejection records. Queries are
//! simpler (fixed newest-first ordering) and the statistics add a rolling
//! 24-hour window on top of by-partner and by-code breakdowns.

use crate::query::{paginate, Page, Pagination};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use persistence::{DebouncedFlusher, JsonSnapshotStore, StoreError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};
use types::error_event::ErrorEvent;
use types::errors::ErrorCode;
use types::ids::ErrorEventId;
use types::partner::PartnerId;

/// Conjunctive filter over rejection records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorFilter {
    pub partner_id: Option<PartnerId>,
    pub error_code: Option<ErrorCode>,
    /// Inclusive lower bound on `timestamp`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub to: Option<DateTime<Utc>>,
}

impl ErrorFilter {
    pub fn matches(&self, event: &ErrorEvent) -> bool {
        if let Some(partner) = self.partner_id {
            if event.partner_id != partner {
                return false;
            }
        }
        if let Some(code) = self.error_code {
            if event.error_code != code {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Aggregate statistics over all stored rejection records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStatistics {
    pub total_errors: usize,
    /// Every partner of the closed set appears, defaulting to 0.
    pub errors_by_partner: BTreeMap<PartnerId, usize>,
    /// Codes actually observed, with their counts.
    pub errors_by_code: BTreeMap<ErrorCode, usize>,
    /// Records with a timestamp within the last 24 hours.
    pub last_24_hours: usize,
}

#[derive(Default)]
struct Inner {
    records: Vec<ErrorEvent>,
    by_id: HashMap<ErrorEventId, usize>,
}

impl Inner {
    fn from_records(records: Vec<ErrorEvent>) -> Self {
        let mut inner = Inner::default();
        for record in records {
            inner.insert(record);
        }
        inner
    }

    fn insert(&mut self, mut event: ErrorEvent) {
        if event.id.is_nil() {
            event.id = ErrorEventId::new();
        }
        match self.by_id.get(&event.id) {
            Some(&idx) => self.records[idx] = event,
            None => {
                self.by_id.insert(event.id, self.records.len());
                self.records.push(event);
            }
        }
    }
}

/// In-memory error store with optional debounced file snapshots.
pub struct ErrorStore {
    inner: Arc<RwLock<Inner>>,
    flusher: Option<DebouncedFlusher>,
}

impl ErrorStore {
    /// Store without a backing file; state dies with the process.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            flusher: None,
        }
    }

    /// Open a file-backed store, loading any existing snapshot.
    pub fn open(store: JsonSnapshotStore, debounce: Duration) -> Result<Self, StoreError> {
        let records: Vec<ErrorEvent> = store.load()?.unwrap_or_default();
        info!(
            path = %store.path().display(),
            records = records.len(),
            "error store loaded"
        );

        let inner = Arc::new(RwLock::new(Inner::from_records(records)));
        let snapshot_source = Arc::clone(&inner);
        let flusher = DebouncedFlusher::spawn("errors", debounce, move || {
            let records = read(&snapshot_source).records.clone();
            store.write(&records)?;
            Ok(())
        });

        Ok(Self {
            inner,
            flusher: Some(flusher),
        })
    }

    /// Persist a rejection record, assigning an id when it lacks one.
    /// Returns the id the record was stored under.
    pub fn save(&self, event: ErrorEvent) -> ErrorEventId {
        let mut inner = write(&self.inner);
        let assigned = if event.id.is_nil() {
            ErrorEventId::new()
        } else {
            event.id
        };
        let mut event = event;
        event.id = assigned;
        debug!(
            error_event = %assigned,
            partner = %event.partner_id,
            code = %event.error_code,
            "saving rejection record"
        );
        inner.insert(event);
        drop(inner);
        self.mark_dirty();
        assigned
    }

    pub fn save_batch(&self, events: Vec<ErrorEvent>) {
        if events.is_empty() {
            return;
        }
        {
            let mut inner = write(&self.inner);
            for event in events {
                inner.insert(event);
            }
        }
        self.mark_dirty();
    }

    pub fn find_by_id(&self, id: &ErrorEventId) -> Option<ErrorEvent> {
        let inner = read(&self.inner);
        inner.by_id.get(id).map(|&idx| inner.records[idx].clone())
    }

    /// Filter and page, newest first.
    pub fn find_many(&self, filter: &ErrorFilter, pagination: Pagination) -> Page<ErrorEvent> {
        let mut matched: Vec<ErrorEvent> = {
            let inner = read(&self.inner);
            inner
                .records
                .iter()
                .filter(|event| filter.matches(event))
                .cloned()
                .collect()
        };

        // Newest first; stable sort keeps insertion order on equal stamps.
        matched.sort_by(|a, b| b.timestamp_millis().cmp(&a.timestamp_millis()));

        paginate(matched, pagination)
    }

    pub fn count(&self, filter: &ErrorFilter) -> usize {
        read(&self.inner)
            .records
            .iter()
            .filter(|event| filter.matches(event))
            .count()
    }

    pub fn statistics(&self) -> ErrorStatistics {
        let inner = read(&self.inner);
        let cutoff = Utc::now() - ChronoDuration::hours(24);

        let mut errors_by_partner: BTreeMap<PartnerId, usize> =
            PartnerId::ALL.iter().map(|p| (*p, 0)).collect();
        let mut errors_by_code: BTreeMap<ErrorCode, usize> = BTreeMap::new();
        let mut last_24_hours = 0usize;

        for event in &inner.records {
            if let Some(count) = errors_by_partner.get_mut(&event.partner_id) {
                *count += 1;
            }
            *errors_by_code.entry(event.error_code).or_insert(0) += 1;
            if event.timestamp >= cutoff {
                last_24_hours += 1;
            }
        }

        ErrorStatistics {
            total_errors: inner.records.len(),
            errors_by_partner,
            errors_by_code,
            last_24_hours,
        }
    }

    pub fn len(&self) -> usize {
        read(&self.inner).records.len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.inner).records.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = write(&self.inner);
        inner.records.clear();
        inner.by_id.clear();
        drop(inner);
        self.mark_dirty();
    }

    /// Write any pending snapshot now.
    pub fn flush(&self) {
        if let Some(flusher) = &self.flusher {
            flusher.flush();
        }
    }

    fn mark_dirty(&self) {
        if let Some(flusher) = &self.flusher {
            flusher.mark_dirty();
        }
    }
}

fn read(inner: &RwLock<Inner>) -> RwLockReadGuard<'_, Inner> {
    inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(inner: &RwLock<Inner>) -> RwLockWriteGuard<'_, Inner> {
    inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

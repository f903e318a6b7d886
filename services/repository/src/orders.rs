//! Order repository
//!
//! Stores canonical orders in insertion order with two indexes: primary by
//! record id and secondary by `(partner, external id)`. External ids are not
//! unique: a reprocessed order repoints the secondary index at the most
//! recent save while the older body stays reachable by its internal id.
//!
//! The embedded deployment snapshots the full record list to `orders.json`
//! through a debounced flusher; loading rebuilds both indexes.

use crate::query::{paginate, OrderFilter, Page, Pagination, Sort, SortBy, SortOrder};
use persistence::{DebouncedFlusher, JsonSnapshotStore, StoreError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};
use types::ids::OrderEventId;
use types::money::round_to_cents;
use types::order::OrderEvent;
use types::partner::PartnerId;

/// Aggregate statistics over a filter-matched subset of orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatistics {
    pub total_orders: usize,
    /// Every partner of the closed set appears, defaulting to 0.
    pub orders_by_partner: BTreeMap<PartnerId, usize>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_gross_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_net_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
    /// Highest sequence number observed per partner within the subset.
    pub highest_sequence: BTreeMap<PartnerId, u64>,
}

#[derive(Default)]
struct Inner {
    records: Vec<OrderEvent>,
    by_id: HashMap<OrderEventId, usize>,
    by_external: HashMap<(PartnerId, String), OrderEventId>,
}

impl Inner {
    fn from_records(records: Vec<OrderEvent>) -> Self {
        let mut inner = Inner::default();
        for record in records {
            inner.insert(record);
        }
        inner
    }

    fn insert(&mut self, order: OrderEvent) {
        let key = (order.partner_id, order.external_order_id.clone());
        self.by_external.insert(key, order.id);

        match self.by_id.get(&order.id) {
            Some(&idx) => self.records[idx] = order,
            None => {
                self.by_id.insert(order.id, self.records.len());
                self.records.push(order);
            }
        }
    }
}

/// In-memory order store with optional debounced file snapshots.
pub struct OrderStore {
    inner: Arc<RwLock<Inner>>,
    flusher: Option<DebouncedFlusher>,
}

impl OrderStore {
    /// Store without a backing file; state dies with the process.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            flusher: None,
        }
    }

    /// Open a file-backed store, loading any existing snapshot.
    pub fn open(store: JsonSnapshotStore, debounce: Duration) -> Result<Self, StoreError> {
        let records: Vec<OrderEvent> = store.load()?.unwrap_or_default();
        info!(
            path = %store.path().display(),
            records = records.len(),
            "order store loaded"
        );

        let inner = Arc::new(RwLock::new(Inner::from_records(records)));
        let snapshot_source = Arc::clone(&inner);
        let flusher = DebouncedFlusher::spawn("orders", debounce, move || {
            let records = read(&snapshot_source).records.clone();
            store.write(&records)?;
            Ok(())
        });

        Ok(Self {
            inner,
            flusher: Some(flusher),
        })
    }

    /// Persist a single order and maintain the external-id index.
    pub fn save(&self, order: OrderEvent) {
        debug!(
            order = %order.id,
            partner = %order.partner_id,
            sequence = order.sequence_number,
            "saving order"
        );
        write(&self.inner).insert(order);
        self.mark_dirty();
    }

    /// Persist a batch atomically: readers see pre- or post-batch state.
    pub fn save_batch(&self, orders: Vec<OrderEvent>) {
        if orders.is_empty() {
            return;
        }
        {
            let mut inner = write(&self.inner);
            for order in orders {
                inner.insert(order);
            }
        }
        self.mark_dirty();
    }

    pub fn find_by_id(&self, id: &OrderEventId) -> Option<OrderEvent> {
        let inner = read(&self.inner);
        inner.by_id.get(id).map(|&idx| inner.records[idx].clone())
    }

    /// Resolve the most recently saved order for `(partner, external id)`.
    pub fn find_by_external_id(
        &self,
        external_id: &str,
        partner: PartnerId,
    ) -> Option<OrderEvent> {
        let inner = read(&self.inner);
        let id = inner
            .by_external
            .get(&(partner, external_id.to_string()))?;
        inner.by_id.get(id).map(|&idx| inner.records[idx].clone())
    }

    pub fn exists_by_external_id(&self, external_id: &str, partner: PartnerId) -> bool {
        read(&self.inner)
            .by_external
            .contains_key(&(partner, external_id.to_string()))
    }

    /// Filter, sort, then page.
    pub fn find_many(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
        sort: Sort,
    ) -> Page<OrderEvent> {
        let mut matched: Vec<OrderEvent> = {
            let inner = read(&self.inner);
            inner
                .records
                .iter()
                .filter(|order| filter.matches(order))
                .cloned()
                .collect()
        };

        // Stable sort; records enter `matched` in insertion order, so ties
        // keep it.
        matched.sort_by(|a, b| match sort.order {
            SortOrder::Asc => compare_by(a, b, sort.by),
            SortOrder::Desc => compare_by(b, a, sort.by),
        });

        paginate(matched, pagination)
    }

    pub fn count(&self, filter: &OrderFilter) -> usize {
        read(&self.inner)
            .records
            .iter()
            .filter(|order| filter.matches(order))
            .count()
    }

    /// Aggregate statistics over the filter-matched subset.
    pub fn statistics(&self, filter: &OrderFilter) -> OrderStatistics {
        let inner = read(&self.inner);

        let mut orders_by_partner: BTreeMap<PartnerId, usize> =
            PartnerId::ALL.iter().map(|p| (*p, 0)).collect();
        let mut highest_sequence: BTreeMap<PartnerId, u64> =
            PartnerId::ALL.iter().map(|p| (*p, 0)).collect();

        let mut total_orders = 0usize;
        let mut total_gross = Decimal::ZERO;
        let mut total_tax = Decimal::ZERO;
        let mut total_net = Decimal::ZERO;

        for order in inner.records.iter().filter(|order| filter.matches(order)) {
            total_orders += 1;
            total_gross += order.gross_amount;
            total_tax += order.tax_amount;
            total_net += order.net_amount;

            if let Some(count) = orders_by_partner.get_mut(&order.partner_id) {
                *count += 1;
            }
            if let Some(highest) = highest_sequence.get_mut(&order.partner_id) {
                *highest = (*highest).max(order.sequence_number);
            }
        }

        let average_order_value = if total_orders == 0 {
            Decimal::ZERO
        } else {
            round_to_cents(total_gross / Decimal::from(total_orders as u64))
        };

        OrderStatistics {
            total_orders,
            orders_by_partner,
            total_gross_amount: round_to_cents(total_gross),
            total_tax_amount: round_to_cents(total_tax),
            total_net_amount: round_to_cents(total_net),
            average_order_value,
            highest_sequence,
        }
    }

    pub fn len(&self) -> usize {
        read(&self.inner).records.len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.inner).records.is_empty()
    }

    /// Drop every record and index entry.
    pub fn clear(&self) {
        let mut inner = write(&self.inner);
        inner.records.clear();
        inner.by_id.clear();
        inner.by_external.clear();
        drop(inner);
        self.mark_dirty();
    }

    /// Write any pending snapshot now.
    pub fn flush(&self) {
        if let Some(flusher) = &self.flusher {
            flusher.flush();
        }
    }

    /// Message of the last failed snapshot write, if any.
    pub fn persist_error(&self) -> Option<String> {
        self.flusher.as_ref().and_then(|f| f.last_error())
    }

    fn mark_dirty(&self) {
        if let Some(flusher) = &self.flusher {
            flusher.mark_dirty();
        }
    }
}

fn compare_by(a: &OrderEvent, b: &OrderEvent, by: SortBy) -> Ordering {
    match by {
        SortBy::ProcessedAt => a.processed_at_millis().cmp(&b.processed_at_millis()),
        SortBy::TransactionTime => a.transaction_time_millis().cmp(&b.transaction_time_millis()),
        SortBy::GrossAmount => a.gross_amount.cmp(&b.gross_amount),
        SortBy::SequenceNumber => a.sequence_number.cmp(&b.sequence_number),
    }
}

fn read(inner: &RwLock<Inner>) -> RwLockReadGuard<'_, Inner> {
    inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(inner: &RwLock<Inner>) -> RwLockWriteGuard<'_, Inner> {
    inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Service wiring
//!
//! Builds the pipeline from configuration: repositories (file-backed or
//! in-memory), sequence counters, the stream bus, and the coordinator, with
//! the repository sinks subscribed. An order exists in the repository only
//! because it was published on the valid-order stream; the error sink is the
//! only writer of the error store.

use crate::config::FeedConfig;
use crate::coordinator::{BatchResult, FeedCoordinator, ProcessingResult};
use crate::sequence::SequenceGenerator;
use persistence::{JsonSnapshotStore, StoreError};
use repository::{ErrorStore, OrderStore};
use serde_json::Value;
use std::sync::Arc;
use stream::StreamBus;
use tracing::info;
use types::partner::PartnerId;

/// The assembled ingestion pipeline.
pub struct FeedService {
    bus: Arc<StreamBus>,
    orders: Arc<OrderStore>,
    errors: Arc<ErrorStore>,
    sequences: Arc<SequenceGenerator>,
    coordinator: FeedCoordinator,
}

impl FeedService {
    pub fn open(config: &FeedConfig) -> Result<Self, StoreError> {
        let (orders, errors, sequences) = if config.in_memory {
            (
                OrderStore::in_memory(),
                ErrorStore::in_memory(),
                SequenceGenerator::in_memory(),
            )
        } else {
            let dir = &config.data_dir;
            (
                OrderStore::open(
                    JsonSnapshotStore::new(dir.join("orders.json")),
                    config.orders_flush,
                )?,
                ErrorStore::open(
                    JsonSnapshotStore::new(dir.join("errors.json")),
                    config.errors_flush,
                )?,
                SequenceGenerator::open(
                    JsonSnapshotStore::new(dir.join("sequences.json")),
                    config.sequences_flush,
                )?,
            )
        };

        let orders = Arc::new(orders);
        let errors = Arc::new(errors);
        let sequences = Arc::new(sequences);
        let bus = Arc::new(StreamBus::new());

        // Repository sinks. A sink fault is logged by the bus and never
        // un-accepts an order; delivery is at-least-once.
        let order_sink = Arc::clone(&orders);
        bus.valid_orders.subscribe(move |payload| {
            order_sink.save(payload.order_event.clone());
            Ok(())
        });
        let error_sink = Arc::clone(&errors);
        bus.error_orders.subscribe(move |payload| {
            error_sink.save(payload.to_error_event());
            Ok(())
        });

        let coordinator = FeedCoordinator::new(
            Arc::clone(&sequences),
            Arc::clone(&bus),
            Arc::clone(&orders),
            config.duplicate_policy,
        );

        info!(
            in_memory = config.in_memory,
            data_dir = %config.data_dir.display(),
            "feed service ready"
        );

        Ok(Self {
            bus,
            orders,
            errors,
            sequences,
            coordinator,
        })
    }

    pub fn process_single(&self, partner: PartnerId, raw: &Value) -> ProcessingResult {
        self.coordinator.process_single(partner, raw)
    }

    pub fn process_batch(&self, partner: PartnerId, payloads: &[Value]) -> BatchResult {
        self.coordinator.process_batch(partner, payloads)
    }

    pub fn bus(&self) -> &Arc<StreamBus> {
        &self.bus
    }

    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    pub fn errors(&self) -> &Arc<ErrorStore> {
        &self.errors
    }

    pub fn sequences(&self) -> &Arc<SequenceGenerator> {
        &self.sequences
    }

    /// Drain every pending snapshot write now.
    pub fn flush(&self) {
        self.orders.flush();
        self.errors.flush();
        self.sequences.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_a(order_id: &str) -> Value {
        json!({
            "orderId": order_id,
            "skuId": "SKU-1",
            "customerId": "C1",
            "quantity": 5,
            "unitPrice": 20.00,
            "taxRate": 0.1,
            "transactionTimeMs": 1_705_315_800_000_i64
        })
    }

    #[test]
    fn test_accepted_order_lands_in_repository() {
        let service = FeedService::open(&FeedConfig::in_memory()).unwrap();
        service.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));

        assert_eq!(service.orders().len(), 1);
        let stored = service
            .orders()
            .find_by_external_id("ORD-1", PartnerId::PartnerA)
            .unwrap();
        assert_eq!(stored.sequence_number, 1);
        assert!(service.errors().is_empty());
    }

    #[test]
    fn test_rejected_order_lands_in_error_store() {
        let service = FeedService::open(&FeedConfig::in_memory()).unwrap();
        let mut bad = payload_a("ORD-X");
        bad["unitPrice"] = json!(-1);

        service.process_single(PartnerId::PartnerA, &bad);

        assert!(service.orders().is_empty());
        assert_eq!(service.errors().len(), 1);
        let page = service.errors().find_many(
            &repository::ErrorFilter::default(),
            repository::Pagination::default(),
        );
        assert!(!page.data[0].id.is_nil(), "store assigns an id on save");
        assert_eq!(page.data[0].external_order_id.as_deref(), Some("ORD-X"));
    }
}

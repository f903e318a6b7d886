//! Feed coordinator: the sole write path
//!
//! Orchestrates validate → sequence → normalize → fan-out for one payload
//! and for batches. A sequence number is drawn only after validation
//! succeeds, so rejected payloads never consume one and per-partner
//! sequences stay dense. The one exception is a normalization post-condition
//! failure after the number was drawn; that surfaces as
//! `TRANSFORMATION_ERROR` and leaves a documented gap.

use crate::config::DuplicatePolicy;
use crate::normalize;
use crate::sequence::SequenceGenerator;
use crate::validate;
use repository::OrderStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use stream::{ErrorOrderPayload, StreamBus, ValidOrderPayload};
use tracing::{info, warn};
use types::errors::{ErrorCode, FieldError};
use types::partner::PartnerId;
use types::time;

/// Outcome of processing one payload, shaped for the external interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessingResult {
    #[serde(rename_all = "camelCase")]
    Accepted {
        order_id: String,
        partner_id: PartnerId,
        sequence_number: u64,
    },
    #[serde(rename_all = "camelCase")]
    Rejected {
        #[serde(skip_serializing_if = "Option::is_none")]
        order_id: Option<String>,
        partner_id: PartnerId,
        errors: Vec<String>,
    },
}

impl ProcessingResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProcessingResult::Accepted { .. })
    }

    pub fn sequence_number(&self) -> Option<u64> {
        match self {
            ProcessingResult::Accepted {
                sequence_number, ..
            } => Some(*sequence_number),
            ProcessingResult::Rejected { .. } => None,
        }
    }
}

/// Outcome of a batch submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub results: Vec<ProcessingResult>,
}

/// Write-path orchestrator over the sequence generator and the stream bus.
pub struct FeedCoordinator {
    sequences: Arc<SequenceGenerator>,
    bus: Arc<StreamBus>,
    orders: Arc<OrderStore>,
    duplicate_policy: DuplicatePolicy,
}

impl FeedCoordinator {
    pub fn new(
        sequences: Arc<SequenceGenerator>,
        bus: Arc<StreamBus>,
        orders: Arc<OrderStore>,
        duplicate_policy: DuplicatePolicy,
    ) -> Self {
        Self {
            sequences,
            bus,
            orders,
            duplicate_policy,
        }
    }

    /// Process one raw payload end to end.
    pub fn process_single(&self, partner: PartnerId, raw: &Value) -> ProcessingResult {
        let typed = match validate::validate(partner, raw) {
            Ok(typed) => typed,
            Err(errors) => return self.reject(partner, raw, errors),
        };

        if self.duplicate_policy == DuplicatePolicy::Reject
            && self
                .orders
                .exists_by_external_id(typed.external_order_id(), partner)
        {
            let error = FieldError::new(
                ErrorCode::DuplicateOrder,
                external_id_field(partner),
                format!("order {} was already processed", typed.external_order_id()),
            );
            return self.reject(partner, raw, vec![error]);
        }

        // Validation passed; only now is a sequence number consumed.
        let sequence = self.sequences.next(partner);

        let event = match normalize::normalize(&typed, sequence) {
            Ok(event) => event,
            Err(err) => {
                warn!(partner = %partner, sequence, error = %err, "normalization failed");
                let error = FieldError::new(
                    ErrorCode::TransformationError,
                    "payload",
                    err.to_string(),
                );
                return self.reject(partner, raw, vec![error]);
            }
        };

        info!(
            partner = %partner,
            order = %event.external_order_id,
            sequence,
            "order accepted"
        );

        let order_id = event.external_order_id.clone();
        self.bus.valid_orders.emit(ValidOrderPayload {
            order_event: event,
            received_at: time::now_millis(),
        });

        ProcessingResult::Accepted {
            order_id,
            partner_id: partner,
            sequence_number: sequence,
        }
    }

    /// Process a batch element-wise, in order. Partial failure does not
    /// abort: every payload gets its own result.
    pub fn process_batch(&self, partner: PartnerId, payloads: &[Value]) -> BatchResult {
        let results: Vec<ProcessingResult> = payloads
            .iter()
            .map(|raw| self.process_single(partner, raw))
            .collect();

        let accepted = results.iter().filter(|r| r.is_accepted()).count();
        BatchResult {
            total: results.len(),
            accepted,
            rejected: results.len() - accepted,
            results,
        }
    }

    fn reject(
        &self,
        partner: PartnerId,
        raw: &Value,
        errors: Vec<FieldError>,
    ) -> ProcessingResult {
        let original_order_id = extract_external_id(partner, raw);
        warn!(
            partner = %partner,
            order = original_order_id.as_deref().unwrap_or("<unknown>"),
            errors = errors.len(),
            "payload rejected"
        );

        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        self.bus.error_orders.emit(ErrorOrderPayload {
            partner_id: partner,
            original_order_id: original_order_id.clone(),
            errors,
            raw_input: raw.clone(),
            timestamp: time::now_millis(),
        });

        ProcessingResult::Rejected {
            order_id: original_order_id,
            partner_id: partner,
            errors: messages,
        }
    }
}

fn external_id_field(partner: PartnerId) -> &'static str {
    match partner {
        PartnerId::PartnerA => "orderId",
        PartnerId::PartnerB => "transactionId",
    }
}

/// Pull the partner-supplied order id out of a raw payload when it exists as
/// a string, so rejections can still reference it.
fn extract_external_id(partner: PartnerId, raw: &Value) -> Option<String> {
    raw.get(external_id_field(partner))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coordinator(policy: DuplicatePolicy) -> (FeedCoordinator, Arc<StreamBus>, Arc<OrderStore>) {
        let bus = Arc::new(StreamBus::new());
        let orders = Arc::new(OrderStore::in_memory());
        let coordinator = FeedCoordinator::new(
            Arc::new(SequenceGenerator::in_memory()),
            Arc::clone(&bus),
            Arc::clone(&orders),
            policy,
        );
        (coordinator, bus, orders)
    }

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
    fn test_accepted_payload_emits_valid_order() {
        let (coordinator, bus, _) = coordinator(DuplicatePolicy::Accept);

        let result = coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));
        assert_eq!(
            result,
            ProcessingResult::Accepted {
                order_id: "ORD-1".into(),
                partner_id: PartnerId::PartnerA,
                sequence_number: 1,
            }
        );

        assert_eq!(bus.valid_orders.history_len(), 1);
        assert_eq!(bus.error_orders.history_len(), 0);
        let emitted = &bus.valid_orders.history()[0];
        assert_eq!(emitted.order_event.sequence_number, 1);
        assert!(emitted.order_event.check_amounts());
    }

    #[test]
    fn test_rejection_consumes_no_sequence_number() {
        let (coordinator, bus, _) = coordinator(DuplicatePolicy::Accept);

        let mut bad = payload_a("ORD-X");
        bad["quantity"] = json!(-5);
        let result = coordinator.process_single(PartnerId::PartnerA, &bad);

        match &result {
            ProcessingResult::Rejected {
                order_id, errors, ..
            } => {
                assert_eq!(order_id.as_deref(), Some("ORD-X"));
                assert!(errors.iter().any(|e| e.contains("quantity")));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(bus.error_orders.history_len(), 1);
        assert_eq!(bus.valid_orders.history_len(), 0);

        // The next valid order starts the partner's sequence at 1.
        let result = coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));
        assert_eq!(result.sequence_number(), Some(1));
    }

    #[test]
    fn test_rejection_without_extractable_order_id() {
        let (coordinator, bus, _) = coordinator(DuplicatePolicy::Accept);

        let result = coordinator.process_single(PartnerId::PartnerA, &json!({"orderId": 42}));
        match result {
            ProcessingResult::Rejected { order_id, .. } => assert!(order_id.is_none()),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(bus.error_orders.history()[0].original_order_id.is_none());
    }

    #[test]
    fn test_batch_partial_failure_keeps_sequences_contiguous() {
        let (coordinator, _, _) = coordinator(DuplicatePolicy::Accept);

        let mut middle = payload_a("ORD-2");
        middle["quantity"] = json!(0);
        let batch = vec![payload_a("ORD-1"), middle, payload_a("ORD-3")];

        let result = coordinator.process_batch(PartnerId::PartnerA, &batch);
        assert_eq!(result.total, 3);
        assert_eq!(result.accepted, 2);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.results[0].sequence_number(), Some(1));
        assert_eq!(result.results[1].sequence_number(), None);
        assert_eq!(result.results[2].sequence_number(), Some(2));
    }

    #[test]
    fn test_duplicate_policy_reject() {
        let (coordinator, bus, orders) = coordinator(DuplicatePolicy::Reject);

        let first = coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));
        assert!(first.is_accepted());
        // Simulate the repository sink having stored the emitted record.
        orders.save(bus.valid_orders.history()[0].order_event.clone());

        let second = coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));
        match &second {
            ProcessingResult::Rejected { errors, .. } => {
                assert!(errors[0].contains("already processed"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(
            bus.error_orders.history()[0].primary_code(),
            ErrorCode::DuplicateOrder
        );

        // The rejected duplicate consumed no sequence number.
        let third = coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-2"));
        assert_eq!(third.sequence_number(), Some(2));
    }

    #[test]
    fn test_duplicate_policy_accept_overwrites_silently() {
        let (coordinator, bus, orders) = coordinator(DuplicatePolicy::Accept);

        coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));
        orders.save(bus.valid_orders.history()[0].order_event.clone());

        let second = coordinator.process_single(PartnerId::PartnerA, &payload_a("ORD-1"));
        assert_eq!(second.sequence_number(), Some(2));
    }

    #[test]
    fn test_result_serialization_shapes() {
        let accepted = ProcessingResult::Accepted {
            order_id: "ORD-1".into(),
            partner_id: PartnerId::PartnerA,
            sequence_number: 1,
        };
        let json = serde_json::to_value(&accepted).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["orderId"], "ORD-1");
        assert_eq!(json["partnerId"], "PARTNER_A");
        assert_eq!(json["sequenceNumber"], 1);

        let rejected = ProcessingResult::Rejected {
            order_id: None,
            partner_id: PartnerId::PartnerB,
            errors: vec!["qty: must be greater than 0".into()],
        };
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["status"], "rejected");
        assert!(json.get("orderId").is_none());
        assert_eq!(json["errors"][0], "qty: must be greater than 0");
    }
}

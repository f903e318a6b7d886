//! Query surface scenarios against a pipeline-populated repository.

use feed::{FeedConfig, FeedService};
use query::QueryCoordinator;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use types::partner::PartnerId;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn payload_a(order_id: &str, customer: &str, unit_price: f64) -> Value {
    json!({
        "orderId": order_id,
        "skuId": "SKU-1",
        "customerId": customer,
        "quantity": 5,
        "unitPrice": unit_price,
        "taxRate": 0.1,
        "transactionTimeMs": 1_705_315_800_000_i64
    })
}

fn seeded() -> (FeedService, QueryCoordinator) {
    let service = FeedService::open(&FeedConfig::in_memory()).unwrap();
    let coordinator = QueryCoordinator::new(
        Arc::clone(service.orders()),
        Arc::clone(service.errors()),
    );
    (service, coordinator)
}

#[test]
fn paginated_listing_over_25_orders() {
    let (service, queries) = seeded();
    for i in 0..25 {
        service.process_single(
            PartnerId::PartnerA,
            &payload_a(&format!("ORD-{i}"), "C1", 20.0),
        );
    }

    let response = queries
        .list_orders(&params(&[("page", "3"), ("pageSize", "10")]))
        .unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.page.data.len(), 5);
    assert_eq!(response.page.total, 25);
    assert_eq!(response.page.total_pages, 3);
    assert!(!response.page.has_more);
}

#[test]
fn page_size_is_clamped_to_the_ceiling() {
    let (_service, queries) = seeded();
    let response = queries
        .list_orders(&params(&[("pageSize", "5000")]))
        .unwrap();
    assert_eq!(response.page.page_size, 100);
}

#[test]
fn statistics_for_one_partner() {
    let (service, queries) = seeded();
    for order_id in ["ORD-1", "ORD-2", "ORD-3"] {
        service.process_single(PartnerId::PartnerA, &payload_a(order_id, "C1", 20.0));
    }

    let response = queries
        .order_statistics(&params(&[("partnerId", "PARTNER_A")]))
        .unwrap();
    let stats = &response.statistics;
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.total_gross_amount.to_string(), "300.00");
    assert_eq!(stats.average_order_value.to_string(), "100.00");
    assert_eq!(stats.highest_sequence[&PartnerId::PartnerA], 3);
    assert_eq!(stats.highest_sequence[&PartnerId::PartnerB], 0);
}

#[test]
fn lookup_by_internal_and_external_id() {
    let (service, queries) = seeded();
    service.process_single(PartnerId::PartnerA, &payload_a("ORD-1", "C1", 20.0));

    let by_external = queries.order_by_external_id("A", "ORD-1").unwrap();
    assert_eq!(by_external.order.external_order_id, "ORD-1");

    let id = by_external.order.id.to_string();
    let by_id = queries.order_by_id(&id).unwrap();
    assert_eq!(by_id.order.id, by_external.order.id);
}

#[test]
fn missing_lookups_report_not_found() {
    let (_service, queries) = seeded();

    let err = queries.order_by_id("not-a-uuid").unwrap_err();
    assert!(err.is_not_found());

    let err = queries
        .order_by_external_id("PARTNER_A", "ORD-NONE")
        .unwrap_err();
    assert!(err.is_not_found());

    let err = queries.error_by_id("also-not-a-uuid").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn unknown_partner_is_a_client_error() {
    let (_service, queries) = seeded();
    let err = queries
        .orders_by_partner("PARTNER_Z", &params(&[]))
        .unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_PARTNER");
}

#[test]
fn orders_by_partner_and_customer() {
    let (service, queries) = seeded();
    service.process_single(PartnerId::PartnerA, &payload_a("ORD-1", "C1", 20.0));
    service.process_single(PartnerId::PartnerA, &payload_a("ORD-2", "C2", 30.0));
    service.process_single(
        PartnerId::PartnerB,
        &json!({
            "transactionId": "TXN-1",
            "itemCode": "ITM-1",
            "clientId": "C1",
            "qty": 1,
            "price": 10.0,
            "tax": 0,
            "purchaseTime": "2024-01-15T10:30:00Z"
        }),
    );

    let response = queries.orders_by_partner("B", &params(&[])).unwrap();
    assert_eq!(response.page.total, 1);

    let response = queries.orders_by_customer("C1", &params(&[]));
    assert_eq!(response.page.total, 2);
}

#[test]
fn filtered_listing_by_amount_range() {
    let (service, queries) = seeded();
    service.process_single(PartnerId::PartnerA, &payload_a("ORD-1", "C1", 10.0)); // gross 50
    service.process_single(PartnerId::PartnerA, &payload_a("ORD-2", "C1", 20.0)); // gross 100
    service.process_single(PartnerId::PartnerA, &payload_a("ORD-3", "C1", 30.0)); // gross 150

    let response = queries
        .list_orders(&params(&[("minAmount", "50"), ("maxAmount", "100")]))
        .unwrap();
    assert_eq!(response.page.total, 2);

    let response = queries
        .list_orders(&params(&[
            ("sortBy", "grossAmount"),
            ("sortOrder", "desc"),
        ]))
        .unwrap();
    assert_eq!(response.page.data[0].external_order_id, "ORD-3");
}

#[test]
fn error_queries_and_statistics() {
    let (service, queries) = seeded();
    let mut bad = payload_a("ORD-X", "C1", 20.0);
    bad["quantity"] = json!(0);
    service.process_single(PartnerId::PartnerA, &bad);

    let response = queries
        .list_errors(&params(&[("errorCode", "ZERO_VALUE")]))
        .unwrap();
    assert_eq!(response.page.total, 1);
    let event = &response.page.data[0];
    assert_eq!(event.external_order_id.as_deref(), Some("ORD-X"));

    let by_id = queries.error_by_id(&event.id.to_string()).unwrap();
    assert_eq!(by_id.error.id, event.id);

    let stats = queries.error_statistics();
    assert_eq!(stats.statistics.total_errors, 1);
    assert_eq!(stats.statistics.last_24_hours, 1);

    let filtered = queries
        .list_errors(&params(&[("errorCode", "INVALID_TIMESTAMP")]))
        .unwrap();
    assert_eq!(filtered.page.total, 0);
}

#[test]
fn health_reports_healthy() {
    let (_service, queries) = seeded();
    let health = queries.health();
    assert_eq!(health.status, "healthy");
}

//! The canonical order record
//!
//! One shape for every partner: the normalizer collapses each partner's wire
//! vocabulary, units, and timestamp convention into this record. Records are
//! immutable once constructed; the repository stores them as-is.

use crate::ids::OrderEventId;
use crate::money;
use crate::partner::PartnerId;
use crate::time;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical order record, stored and streamed.
///
/// Amount fields are pre-rounded to two decimals. `sequence_number` is the
/// per-partner position assigned at acceptance; it starts at 1 and never
/// repeats for a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub id: OrderEventId,
    pub external_order_id: String,
    pub partner_id: PartnerId,
    pub sequence_number: u64,
    pub product_id: String,
    pub customer_id: String,
    pub quantity: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_amount: Decimal,
    #[serde(with = "time::iso_millis")]
    pub transaction_time: DateTime<Utc>,
    #[serde(with = "time::iso_millis")]
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl OrderEvent {
    /// Check the amount invariant: gross, tax, and net agree with quantity,
    /// price, and rate under cent rounding.
    pub fn check_amounts(&self) -> bool {
        let gross = money::gross_amount(self.quantity, self.unit_price);
        let tax = gross.and_then(|g| money::tax_amount(g, self.tax_rate));
        let net = match (gross, tax) {
            (Some(g), Some(t)) => money::net_amount(g, t),
            _ => None,
        };
        gross == Some(self.gross_amount)
            && tax == Some(self.tax_amount)
            && net == Some(self.net_amount)
    }

    /// Transaction time as epoch milliseconds, for sort comparisons.
    pub fn transaction_time_millis(&self) -> i64 {
        self.transaction_time.timestamp_millis()
    }

    /// Processing time as epoch milliseconds, for sort comparisons.
    pub fn processed_at_millis(&self) -> i64 {
        self.processed_at.timestamp_millis()
    }
}

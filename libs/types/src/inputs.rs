//! Validated per-partner input shapes
//!
//! Each partner speaks its own wire vocabulary; these are the typed values a
//! payload becomes once its partner's validator accepts it. Nothing outside
//! the validator/normalizer pair branches on the partner variant.

use crate::partner::PartnerId;
use crate::time;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Partner A order submission, post-validation.
///
/// Partner A reports prices with a decimal tax rate and timestamps as Unix
/// epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerAInput {
    pub order_id: String,
    pub sku_id: String,
    pub customer_id: String,
    pub quantity: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
    pub transaction_time_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Partner B order submission, post-validation.
///
/// Partner B reports tax as a percentage and timestamps as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerBInput {
    pub transaction_id: String,
    pub item_code: String,
    pub client_id: String,
    pub qty: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "time::iso_millis")]
    pub purchase_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A validated payload from any partner.
#[derive(Debug, Clone, PartialEq)]
pub enum PartnerInput {
    A(PartnerAInput),
    B(PartnerBInput),
}

impl PartnerInput {
    /// The partner that produced this input.
    pub fn partner_id(&self) -> PartnerId {
        match self {
            PartnerInput::A(_) => PartnerId::PartnerA,
            PartnerInput::B(_) => PartnerId::PartnerB,
        }
    }

    /// The partner-supplied order identifier.
    pub fn external_order_id(&self) -> &str {
        match self {
            PartnerInput::A(input) => &input.order_id,
            PartnerInput::B(input) => &input.transaction_id,
        }
    }
}

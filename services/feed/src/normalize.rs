//! Canonical record construction
//!
//! Translates a validated partner input into the canonical order record:
//! field renames, unit conversion (partner B's percentage tax becomes a
//! decimal rate), timestamp re-emission as UTC milliseconds, and derived
//! amount arithmetic. Pure except for id generation and the processing
//! stamp.

use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use types::ids::OrderEventId;
use types::inputs::{PartnerAInput, PartnerBInput, PartnerInput};
use types::money;
use types::order::OrderEvent;
use types::partner::PartnerId;
use types::time;

/// A post-condition failed after validation already passed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("transaction time {0}ms is outside the representable range")]
    TimestampOutOfRange(i64),

    #[error("amount arithmetic overflowed for quantity {quantity} at unit price {unit_price}")]
    AmountOverflow { quantity: u64, unit_price: Decimal },
}

/// Build the canonical record for a validated input and its sequence number.
pub fn normalize(input: &PartnerInput, sequence: u64) -> Result<OrderEvent, NormalizeError> {
    match input {
        PartnerInput::A(input) => normalize_a(input, sequence),
        PartnerInput::B(input) => normalize_b(input, sequence),
    }
}

fn normalize_a(input: &PartnerAInput, sequence: u64) -> Result<OrderEvent, NormalizeError> {
    let transaction_time = time::from_epoch_millis(input.transaction_time_ms)
        .ok_or(NormalizeError::TimestampOutOfRange(input.transaction_time_ms))?;

    build(
        PartnerId::PartnerA,
        sequence,
        input.order_id.clone(),
        input.sku_id.clone(),
        input.customer_id.clone(),
        input.quantity,
        input.unit_price,
        input.tax_rate,
        transaction_time,
        input.metadata.clone(),
    )
}

fn normalize_b(input: &PartnerBInput, sequence: u64) -> Result<OrderEvent, NormalizeError> {
    // Partner B reports tax as a percentage.
    let tax_rate = input.tax / Decimal::ONE_HUNDRED;
    let metadata = input.notes.as_ref().map(|notes| json!({ "notes": notes }));

    build(
        PartnerId::PartnerB,
        sequence,
        input.transaction_id.clone(),
        input.item_code.clone(),
        input.client_id.clone(),
        input.qty,
        input.price,
        tax_rate,
        time::truncate_to_millis(input.purchase_time),
        metadata,
    )
}

#[allow(clippy::too_many_arguments)]
fn build(
    partner_id: PartnerId,
    sequence: u64,
    external_order_id: String,
    product_id: String,
    customer_id: String,
    quantity: u64,
    unit_price: Decimal,
    tax_rate: Decimal,
    transaction_time: chrono::DateTime<chrono::Utc>,
    metadata: Option<serde_json::Value>,
) -> Result<OrderEvent, NormalizeError> {
    let unit_price = money::round_to_cents(unit_price);
    let overflow = NormalizeError::AmountOverflow {
        quantity,
        unit_price,
    };

    let gross_amount = money::gross_amount(quantity, unit_price).ok_or_else(|| overflow.clone())?;
    let tax_amount = money::tax_amount(gross_amount, tax_rate).ok_or_else(|| overflow.clone())?;
    let net_amount = money::net_amount(gross_amount, tax_amount).ok_or(overflow)?;

    Ok(OrderEvent {
        id: OrderEventId::new(),
        external_order_id,
        partner_id,
        sequence_number: sequence,
        product_id,
        customer_id,
        quantity,
        unit_price,
        tax_rate,
        gross_amount,
        tax_amount,
        net_amount,
        transaction_time,
        processed_at: time::now_millis(),
        metadata,
    })
}

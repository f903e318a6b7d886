//! Decimal amount arithmetic
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! All stored amounts are rounded to two decimals with HALF_UP rounding, so
//! `2.172825` rounds to `2.17` and `2.175` rounds to `2.18`.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Round an amount to two decimals using the HALF_UP strategy.
///
/// The result always carries exactly two decimal places, so `100`, `100.0`,
/// and `100.00` all store and render identically.
pub fn round_to_cents(value: Decimal) -> Decimal {
    let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

/// Gross amount: `quantity × unit_price`, rounded to cents.
///
/// Returns `None` on decimal overflow.
pub fn gross_amount(quantity: u64, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(round_to_cents)
}

/// Tax amount: `gross × rate`, rounded to cents.
pub fn tax_amount(gross: Decimal, tax_rate: Decimal) -> Option<Decimal> {
    gross.checked_mul(tax_rate).map(round_to_cents)
}

/// Net amount: `gross + tax`, rounded to cents.
pub fn net_amount(gross: Decimal, tax: Decimal) -> Option<Decimal> {
    gross.checked_add(tax).map(round_to_cents)
}

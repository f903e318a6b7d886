//! Partner B schema validation
//!
//! Partner B submits tax as a percentage in `[0, 100]` and purchase times as
//! ISO-8601 strings, which must parse to an instant.

use super::*;
use chrono::{DateTime, Utc};
use types::errors::{ErrorCode, FieldError};
use types::inputs::PartnerBInput;
use types::time;

pub fn validate(raw: &Value) -> Result<PartnerBInput, Vec<FieldError>> {
    let map = root_object(raw)?;
    let mut errors = Vec::new();

    let transaction_id = required_string(map, "transactionId", &mut errors);
    let item_code = required_string(map, "itemCode", &mut errors);
    let client_id = required_string(map, "clientId", &mut errors);
    let qty = required_positive_integer(map, "qty", &mut errors);
    let price = required_positive_number(map, "price", &mut errors);
    let tax = required_rate(map, "tax", Decimal::ONE_HUNDRED, &mut errors);
    let purchase_time = required_instant(map, "purchaseTime", &mut errors);
    let notes = optional_string(map, "notes", &mut errors);

    match (
        transaction_id,
        item_code,
        client_id,
        qty,
        price,
        tax,
        purchase_time,
    ) {
        (
            Some(transaction_id),
            Some(item_code),
            Some(client_id),
            Some(qty),
            Some(price),
            Some(tax),
            Some(purchase_time),
        ) if errors.is_empty() => Ok(PartnerBInput {
            transaction_id,
            item_code,
            client_id,
            qty,
            price,
            tax,
            purchase_time,
            notes,
        }),
        _ => Err(errors),
    }
}

/// ISO-8601 instant carried as a string.
fn required_instant(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    let raw = match map.get(field) {
        None => {
            errors.push(missing(field));
            return None;
        }
        Some(Value::Null) => {
            errors.push(null_value(field));
            return None;
        }
        Some(Value::String(s)) => s,
        Some(other) => {
            errors.push(wrong_type(field, other, "string"));
            return None;
        }
    };

    if raw.trim().is_empty() {
        errors.push(
            FieldError::new(
                ErrorCode::InvalidValue,
                field,
                "must not be empty or whitespace-only",
            )
            .received(Value::String(raw.clone())),
        );
        return None;
    }

    match time::parse_instant(raw) {
        Some(instant) => Some(instant),
        None => {
            errors.push(
                FieldError::new(
                    ErrorCode::InvalidTimestamp,
                    field,
                    "must be an ISO-8601 instant",
                )
                .received(Value::String(raw.clone())),
            );
            None
        }
    }
}

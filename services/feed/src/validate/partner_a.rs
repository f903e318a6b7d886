//! Partner A schema validation
//!
//! Partner A submits decimal tax rates in `[0, 1]` and transaction times as
//! Unix epoch milliseconds, which must land inside the plausibility window
//! `[2000-01-01T00:00:00Z, now + 100y]`.

use super::*;
use types::errors::{ErrorCode, FieldError};
use types::inputs::PartnerAInput;
use types::time;

pub fn validate(raw: &Value) -> Result<PartnerAInput, Vec<FieldError>> {
    let map = root_object(raw)?;
    let mut errors = Vec::new();

    let order_id = required_string(map, "orderId", &mut errors);
    let sku_id = required_string(map, "skuId", &mut errors);
    let customer_id = required_string(map, "customerId", &mut errors);
    let quantity = required_positive_integer(map, "quantity", &mut errors);
    let unit_price = required_positive_number(map, "unitPrice", &mut errors);
    let tax_rate = required_rate(map, "taxRate", Decimal::ONE, &mut errors);
    let transaction_time_ms = required_timestamp_ms(map, "transactionTimeMs", &mut errors);
    let metadata = optional_object(map, "metadata", &mut errors);

    match (
        order_id,
        sku_id,
        customer_id,
        quantity,
        unit_price,
        tax_rate,
        transaction_time_ms,
    ) {
        (
            Some(order_id),
            Some(sku_id),
            Some(customer_id),
            Some(quantity),
            Some(unit_price),
            Some(tax_rate),
            Some(transaction_time_ms),
        ) if errors.is_empty() => Ok(PartnerAInput {
            order_id,
            sku_id,
            customer_id,
            quantity,
            unit_price,
            tax_rate,
            transaction_time_ms,
            metadata,
        }),
        _ => Err(errors),
    }
}

/// Epoch-millisecond timestamp inside the plausibility window.
fn required_timestamp_ms(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let ms = match map.get(field) {
        None => {
            errors.push(missing(field));
            return None;
        }
        Some(Value::Null) => {
            errors.push(null_value(field));
            return None;
        }
        Some(Value::Number(n)) => match n.as_i64() {
            Some(ms) => ms,
            None => {
                errors.push(
                    FieldError::new(ErrorCode::InvalidDataType, field, "must be an integer")
                        .received(Value::Number(n.clone()))
                        .expected("integer"),
                );
                return None;
            }
        },
        Some(other) => {
            errors.push(wrong_type(field, other, "integer"));
            return None;
        }
    };

    if ms < time::MIN_TRANSACTION_TIME_MS {
        errors.push(
            FieldError::new(
                ErrorCode::InvalidTimestamp,
                field,
                "must not be before 2000-01-01T00:00:00Z",
            )
            .received(Value::from(ms)),
        );
        return None;
    }

    match time::from_epoch_millis(ms) {
        Some(instant) if instant <= time::max_plausible_time() => Some(ms),
        _ => {
            errors.push(
                FieldError::new(
                    ErrorCode::InvalidTimestamp,
                    field,
                    "must not be more than 100 years in the future",
                )
                .received(Value::from(ms)),
            );
            None
        }
    }
}

//! Per-partner payload validation
//!
//! One validator per partner wire schema. Validation collects every
//! field-level diagnostic instead of stopping at the first: a payload with a
//! bad quantity and a bad timestamp reports both. Root and type failures
//! short-circuit only the offending field; the rest are still checked.

use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use types::errors::{ErrorCode, FieldError};
use types::inputs::PartnerInput;
use types::partner::PartnerId;

pub mod partner_a;
pub mod partner_b;

/// Dispatch a raw payload to its partner's validator.
pub fn validate(partner: PartnerId, raw: &Value) -> Result<PartnerInput, Vec<FieldError>> {
    match partner {
        PartnerId::PartnerA => partner_a::validate(raw).map(PartnerInput::A),
        PartnerId::PartnerB => partner_b::validate(raw).map(PartnerInput::B),
    }
}

/// The payload root must be a JSON object.
pub(crate) fn root_object(raw: &Value) -> Result<&Map<String, Value>, Vec<FieldError>> {
    match raw {
        Value::Object(map) => Ok(map),
        other => Err(vec![FieldError::new(
            ErrorCode::InvalidDataType,
            "payload",
            "payload must be a JSON object",
        )
        .received(other.clone())
        .expected("object")]),
    }
}

/// Required string: present, non-null, a string, non-blank.
pub(crate) fn required_string(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match map.get(field) {
        None => {
            errors.push(missing(field));
            None
        }
        Some(Value::Null) => {
            errors.push(null_value(field));
            None
        }
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                errors.push(
                    FieldError::new(
                        ErrorCode::InvalidValue,
                        field,
                        "must not be empty or whitespace-only",
                    )
                    .received(Value::String(s.clone())),
                );
                None
            } else {
                Some(s.clone())
            }
        }
        Some(other) => {
            errors.push(wrong_type(field, other, "string"));
            None
        }
    }
}

/// Optional string: absent or null is fine, anything present must be a
/// non-blank string.
pub(crate) fn optional_string(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                errors.push(
                    FieldError::new(
                        ErrorCode::InvalidValue,
                        field,
                        "must not be empty or whitespace-only",
                    )
                    .received(Value::String(s.clone())),
                );
                None
            } else {
                Some(s.clone())
            }
        }
        Some(other) => {
            errors.push(wrong_type(field, other, "string"));
            None
        }
    }
}

/// Optional mapping, passed through opaquely.
pub(crate) fn optional_object(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(value @ Value::Object(_)) => Some(value.clone()),
        Some(other) => {
            errors.push(wrong_type(field, other, "object"));
            None
        }
    }
}

/// Required positive integer (`> 0`).
pub(crate) fn required_positive_integer(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<u64> {
    match map.get(field) {
        None => {
            errors.push(missing(field));
            None
        }
        Some(Value::Null) => {
            errors.push(null_value(field));
            None
        }
        Some(Value::Number(n)) => {
            if let Some(value) = n.as_u64() {
                if value == 0 {
                    errors.push(
                        FieldError::new(ErrorCode::ZeroValue, field, "must be greater than 0")
                            .received(Value::Number(n.clone())),
                    );
                    None
                } else {
                    Some(value)
                }
            } else if n.as_i64().is_some() || n.as_f64().is_some_and(|f| f < 0.0) {
                errors.push(
                    FieldError::new(ErrorCode::NegativeNumber, field, "must be greater than 0")
                        .received(Value::Number(n.clone())),
                );
                None
            } else {
                errors.push(
                    FieldError::new(ErrorCode::InvalidDataType, field, "must be an integer")
                        .received(Value::Number(n.clone()))
                        .expected("integer"),
                );
                None
            }
        }
        Some(other) => {
            errors.push(wrong_type(field, other, "integer"));
            None
        }
    }
}

/// Required strictly positive number.
pub(crate) fn required_positive_number(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    let value = required_number(map, field, errors)?;
    if value < Decimal::ZERO {
        errors.push(FieldError::new(
            ErrorCode::NegativeNumber,
            field,
            "must be greater than 0",
        ));
        None
    } else if value.is_zero() {
        errors.push(FieldError::new(
            ErrorCode::ZeroValue,
            field,
            "must be greater than 0",
        ));
        None
    } else {
        Some(value)
    }
}

/// Required rate within `[0, max]`, inclusive at both ends.
pub(crate) fn required_rate(
    map: &Map<String, Value>,
    field: &str,
    max: Decimal,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    let value = required_number(map, field, errors)?;
    if value < Decimal::ZERO || value > max {
        errors.push(FieldError::new(
            ErrorCode::InvalidValue,
            field,
            format!("must be between 0 and {max}"),
        ));
        None
    } else {
        Some(value)
    }
}

/// Required finite number of any sign.
fn required_number(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    match map.get(field) {
        None => {
            errors.push(missing(field));
            None
        }
        Some(Value::Null) => {
            errors.push(null_value(field));
            None
        }
        Some(Value::Number(n)) => {
            if n.as_f64().is_some_and(|f| !f.is_finite()) {
                errors.push(
                    FieldError::new(ErrorCode::NotANumber, field, "must be a finite number")
                        .received(Value::Number(n.clone())),
                );
                return None;
            }
            match decimal_of(n) {
                Some(value) => Some(value),
                None => {
                    errors.push(
                        FieldError::new(ErrorCode::NotANumber, field, "must be a finite number")
                            .received(Value::Number(n.clone())),
                    );
                    None
                }
            }
        }
        Some(other) => {
            errors.push(wrong_type(field, other, "number"));
            None
        }
    }
}

/// Convert a JSON number to a decimal without a float detour where possible,
/// so `20.07` stays exactly `20.07`.
pub(crate) fn decimal_of(n: &Number) -> Option<Decimal> {
    use std::str::FromStr;
    Decimal::from_str(&n.to_string())
        .ok()
        .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain))
}

pub(crate) fn missing(field: &str) -> FieldError {
    FieldError::new(ErrorCode::MissingRequiredField, field, "required field is missing")
}

pub(crate) fn null_value(field: &str) -> FieldError {
    FieldError::new(ErrorCode::NullValue, field, "must not be null")
}

pub(crate) fn wrong_type(field: &str, received: &Value, expected: &str) -> FieldError {
    FieldError::new(
        ErrorCode::InvalidDataType,
        field,
        format!("must be of type {expected}"),
    )
    .received(received.clone())
    .expected(expected)
}

//! Event payloads carried on the stream bus
//!
//! Two kinds are multiplexed: `VALID_ORDER` wraps a canonical record that
//! passed validation and received its sequence number; `ERROR_ORDER` wraps a
//! rejected payload with its field diagnostics. The error sink turns an
//! `ErrorOrderPayload` into the stored `ErrorEvent` form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use types::prelude::*;
use types::time;

/// Payload of a `VALID_ORDER` emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidOrderPayload {
    pub order_event: OrderEvent,
    #[serde(with = "time::iso_millis")]
    pub received_at: DateTime<Utc>,
}

/// Payload of an `ERROR_ORDER` emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOrderPayload {
    pub partner_id: PartnerId,
    /// Partner-supplied order id, when the raw payload carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_order_id: Option<String>,
    pub errors: Vec<FieldError>,
    /// The payload exactly as received.
    pub raw_input: Value,
    #[serde(with = "time::iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl ErrorOrderPayload {
    /// Code of the leading diagnostic; `INTERNAL_ERROR` if none was recorded.
    pub fn primary_code(&self) -> ErrorCode {
        self.errors
            .first()
            .map(|e| e.code)
            .unwrap_or(ErrorCode::InternalError)
    }

    /// Convert into the stored rejection form. The id is left nil for the
    /// error store to assign on save.
    pub fn to_error_event(&self) -> ErrorEvent {
        let message = self
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "payload rejected".to_string());

        ErrorEvent {
            id: ErrorEventId::nil(),
            partner_id: self.partner_id,
            external_order_id: self.original_order_id.clone(),
            error_code: self.primary_code(),
            message,
            details: self.errors.clone(),
            original_payload: self.raw_input.clone(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> ErrorOrderPayload {
        ErrorOrderPayload {
            partner_id: PartnerId::PartnerB,
            original_order_id: Some("TXN-7".into()),
            errors: vec![
                FieldError::new(ErrorCode::NegativeNumber, "qty", "must be greater than 0"),
                FieldError::new(ErrorCode::InvalidTimestamp, "purchaseTime", "unparseable"),
            ],
            raw_input: json!({"transactionId": "TXN-7", "qty": -1}),
            timestamp: time::from_epoch_millis(1_705_315_800_000).unwrap(),
        }
    }

    #[test]
    fn test_primary_code_is_first_error() {
        assert_eq!(sample_payload().primary_code(), ErrorCode::NegativeNumber);
    }

    #[test]
    fn test_primary_code_defaults_to_internal_error() {
        let mut payload = sample_payload();
        payload.errors.clear();
        assert_eq!(payload.primary_code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_to_error_event_carries_diagnostics() {
        let payload = sample_payload();
        let event = payload.to_error_event();

        assert!(event.id.is_nil());
        assert_eq!(event.partner_id, PartnerId::PartnerB);
        assert_eq!(event.external_order_id.as_deref(), Some("TXN-7"));
        assert_eq!(event.error_code, ErrorCode::NegativeNumber);
        assert_eq!(event.message, "qty: must be greater than 0");
        assert_eq!(event.details.len(), 2);
        assert_eq!(event.original_payload, payload.raw_input);
        assert_eq!(event.timestamp, payload.timestamp);
    }

    #[test]
    fn test_error_payload_serde_roundtrip() {
        let payload = sample_payload();
        let json = serde_json::to_string(&payload).unwrap();
        let back: ErrorOrderPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, back);
    }
}

//! Stored rejection records
//!
//! When a payload fails validation it never becomes an order; it becomes one
//! of these, preserving the untouched original payload next to structured
//! field diagnostics.

use crate::errors::{ErrorCode, FieldError};
use crate::ids::ErrorEventId;
use crate::partner::PartnerId;
use crate::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A rejected payload with its diagnostics, as persisted by the error store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    /// Nil until the error store assigns an identifier on save.
    pub id: ErrorEventId,
    pub partner_id: PartnerId,
    /// Partner-supplied order id, when it could be extracted from the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_order_id: Option<String>,
    /// Code of the leading diagnostic.
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Vec<FieldError>,
    /// The payload exactly as received, for operator inspection.
    pub original_payload: Value,
    #[serde(with = "time::iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl ErrorEvent {
    /// Timestamp as epoch milliseconds, for sort comparisons.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

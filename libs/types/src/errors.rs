//! Error taxonomy
//!
//! Shared vocabulary between the validators, the error store, and the query
//! surface. Validation failures are values (`Vec<FieldError>`), never panics
//! or exceptions at the pipeline boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Closed set of diagnostic codes attached to rejected payloads and faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Required key absent from the payload.
    MissingRequiredField,
    /// Key present but the value is null.
    NullValue,
    /// Value has the wrong JSON type.
    InvalidDataType,
    /// Value has the right type but is outside the permitted domain
    /// (empty string, whitespace-only string, rate out of range).
    InvalidValue,
    /// Numeric value below zero where a positive number is required.
    NegativeNumber,
    /// Numeric value of exactly zero where a positive number is required.
    ZeroValue,
    /// Numeric value that is not a finite number.
    NotANumber,
    /// Timestamp unparseable or outside the plausibility window.
    InvalidTimestamp,
    /// Reserved for future policy; future-dated orders are not rejected.
    FutureTimestamp,
    /// Resubmission of an already-stored external order id, when the
    /// duplicate policy rejects them.
    DuplicateOrder,
    /// Partner identifier outside the closed set.
    UnknownPartner,
    /// Normalization post-condition failed after validation passed.
    TransformationError,
    /// Repository or persistence fault.
    InternalError,
}

impl ErrorCode {
    /// Wire form of the code (`"MISSING_REQUIRED_FIELD"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::NullValue => "NULL_VALUE",
            ErrorCode::InvalidDataType => "INVALID_DATA_TYPE",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::NegativeNumber => "NEGATIVE_NUMBER",
            ErrorCode::ZeroValue => "ZERO_VALUE",
            ErrorCode::NotANumber => "NOT_A_NUMBER",
            ErrorCode::InvalidTimestamp => "INVALID_TIMESTAMP",
            ErrorCode::FutureTimestamp => "FUTURE_TIMESTAMP",
            ErrorCode::DuplicateOrder => "DUPLICATE_ORDER",
            ErrorCode::UnknownPartner => "UNKNOWN_PARTNER",
            ErrorCode::TransformationError => "TRANSFORMATION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MISSING_REQUIRED_FIELD" => Ok(ErrorCode::MissingRequiredField),
            "NULL_VALUE" => Ok(ErrorCode::NullValue),
            "INVALID_DATA_TYPE" => Ok(ErrorCode::InvalidDataType),
            "INVALID_VALUE" => Ok(ErrorCode::InvalidValue),
            "NEGATIVE_NUMBER" => Ok(ErrorCode::NegativeNumber),
            "ZERO_VALUE" => Ok(ErrorCode::ZeroValue),
            "NOT_A_NUMBER" => Ok(ErrorCode::NotANumber),
            "INVALID_TIMESTAMP" => Ok(ErrorCode::InvalidTimestamp),
            "FUTURE_TIMESTAMP" => Ok(ErrorCode::FutureTimestamp),
            "DUPLICATE_ORDER" => Ok(ErrorCode::DuplicateOrder),
            "UNKNOWN_PARTNER" => Ok(ErrorCode::UnknownPartner),
            "TRANSFORMATION_ERROR" => Ok(ErrorCode::TransformationError),
            "INTERNAL_ERROR" => Ok(ErrorCode::InternalError),
            _ => Err(()),
        }
    }
}

/// A single field-level diagnostic produced during payload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub code: ErrorCode,
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<String>,
}

impl FieldError {
    pub fn new(code: ErrorCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            message: message.into(),
            received_value: None,
            expected_type: None,
        }
    }

    /// Attach the offending value as received on the wire.
    pub fn received(mut self, value: Value) -> Self {
        self.received_value = Some(value);
        self
    }

    /// Attach the type the field was expected to carry.
    pub fn expected(mut self, ty: impl Into<String>) -> Self {
        self.expected_type = Some(ty.into());
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

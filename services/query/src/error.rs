use thiserror::Error;

/// Failures a query can report back to the transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("unknown partner: {0}")]
    UnknownPartner(String),

    #[error("invalid {param}: {message}")]
    InvalidParameter { param: &'static str, message: String },

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("error event not found: {0}")]
    ErrorEventNotFound(String),
}

impl QueryError {
    pub fn invalid(param: &'static str, message: impl Into<String>) -> Self {
        QueryError::InvalidParameter {
            param,
            message: message.into(),
        }
    }

    /// Stable code for the transport to map onto a status line:
    /// not-found codes become 404, the rest 400.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownPartner(_) => "UNKNOWN_PARTNER",
            QueryError::InvalidParameter { .. } => "INVALID_PARAMETER",
            QueryError::OrderNotFound(_) | QueryError::ErrorEventNotFound(_) => "NOT_FOUND",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "NOT_FOUND"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(QueryError::UnknownPartner("X".into()).code(), "UNKNOWN_PARTNER");
        assert_eq!(QueryError::invalid("fromDate", "bad").code(), "INVALID_PARAMETER");
        assert!(QueryError::OrderNotFound("id".into()).is_not_found());
        assert!(QueryError::ErrorEventNotFound("id".into()).is_not_found());
    }

    #[test]
    fn test_display() {
        let err = QueryError::invalid("minAmount", "not a number");
        assert_eq!(err.to_string(), "invalid minAmount: not a number");
    }
}

//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request failed validation; `field` uses the wire spelling
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Gateway could not be reached at all
    #[error("Gateway unreachable: {0}")]
    GatewayUnavailable(String),

    /// Gateway was reached but refused the operation
    #[error("Gateway rejected: {0}")]
    GatewayRejected(String),

    /// Transaction reference unknown to the gateway
    #[error("Transaction not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::GatewayUnavailable(_) | PaymentError::Storage(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Validation { reason, .. } => reason,
            PaymentError::GatewayUnavailable(_) => {
                "Unable to connect to the payment service. Please try again."
            }
            PaymentError::GatewayRejected(message) => message,
            PaymentError::NotFound(_) => "Transaction not found.",
            PaymentError::Config(_) => "Service configuration error.",
            PaymentError::Storage(_) => "An error occurred processing your request.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_passthrough() {
        let err = PaymentError::Validation {
            field: "email",
            reason: "A valid email address is required".into(),
        };
        assert_eq!(err.user_message(), "A valid email address is required");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unavailable_is_retryable() {
        let err = PaymentError::GatewayUnavailable("connect timeout".into());
        assert!(err.is_retryable());
        assert!(err.user_message().starts_with("Unable to connect"));
    }

    #[test]
    fn test_rejection_keeps_gateway_message() {
        let err = PaymentError::GatewayRejected("Insufficient balance".into());
        assert_eq!(err.user_message(), "Insufficient balance");
    }
}

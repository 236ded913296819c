//! Storefront Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors surfaced to the storefront UI
#[derive(Error, Debug)]
pub enum FlowError {
    /// Backend rejected the payment attempt
    #[error("Payment rejected: {0}")]
    Rejected(String),

    /// Backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Backend response did not match the expected envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Checkout URL missing or unusable
    #[error("Invalid checkout URL")]
    InvalidCheckoutUrl,

    /// Local storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Submission failed client-side validation
    #[error("Invalid submission: {0}")]
    Invalid(String),
}

impl FlowError {
    /// Whether retrying the same action can help
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::Network(_))
    }

    /// User-friendly message for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Rejected(message) | FlowError::Invalid(message) => message.clone(),
            FlowError::Network(_) => {
                "Unable to connect to payment server. Please check your network connection."
                    .to_string()
            }
            FlowError::InvalidResponse(_) | FlowError::InvalidCheckoutUrl => {
                "Failed to get checkout URL".to_string()
            }
            FlowError::Storage(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(FlowError::Network("timeout".into()).is_retryable());
        assert!(!FlowError::Rejected("declined".into()).is_retryable());
        assert!(!FlowError::InvalidCheckoutUrl.is_retryable());
    }

    #[test]
    fn test_network_message_names_the_connection() {
        let message = FlowError::Network("dns".into()).user_message();
        assert!(message.contains("network connection"));
    }
}

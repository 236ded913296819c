//! Backend API Client
//!
//! Thin HTTP client for the planstore payment server. The app never
//! talks to the gateway directly.

use std::time::Duration;

use planstore_payments::{
    CheckoutSession, Envelope, PaymentSubmission, TransactionStatus, VerifiedTransaction,
};

use crate::error::{FlowError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the payment backend
pub struct PaymentsApi {
    base_url: String,
    client: reqwest::Client,
}

impl PaymentsApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FlowError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a payment and get back the hosted checkout session.
    ///
    /// The idempotency key makes a retried submit land on the same
    /// session instead of charging twice.
    pub async fn initialize(
        &self,
        submission: &PaymentSubmission,
        idempotency_key: &str,
    ) -> Result<CheckoutSession> {
        let url = format!("{}/payment", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("idempotency-key", idempotency_key)
            .json(submission)
            .send()
            .await
            .map_err(|e| FlowError::Network(e.to_string()))?;

        let envelope: Envelope<CheckoutSession> = response
            .json()
            .await
            .map_err(|e| FlowError::InvalidResponse(e.to_string()))?;

        session_from_envelope(envelope)
    }

    /// Ask the backend for a transaction's status.
    ///
    /// Anything short of a confirmed success reads as `Failed`; the
    /// caller never treats a verification problem as a paid state.
    pub async fn verify(&self, tx_ref: &str) -> Result<TransactionStatus> {
        let url = format!("{}/api/verify/{}", self.base_url, tx_ref);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FlowError::Network(e.to_string()))?;

        let envelope: Envelope<VerifiedTransaction> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(tx_ref, "Unreadable verification response: {}", e);
                return Ok(TransactionStatus::Failed);
            }
        };

        Ok(status_from_envelope(envelope))
    }
}

fn session_from_envelope(envelope: Envelope<CheckoutSession>) -> Result<CheckoutSession> {
    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "Payment could not be initialized".into());
        return Err(FlowError::Rejected(message));
    }

    let session = envelope
        .data
        .ok_or_else(|| FlowError::InvalidResponse("success envelope without data".into()))?;

    if session.checkout_url.trim().is_empty() {
        return Err(FlowError::InvalidResponse("empty checkout URL".into()));
    }

    Ok(session)
}

fn status_from_envelope(envelope: Envelope<VerifiedTransaction>) -> TransactionStatus {
    if !envelope.success {
        return TransactionStatus::Failed;
    }

    envelope
        .data
        .map_or(TransactionStatus::Failed, |verified| verified.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(url: &str) -> CheckoutSession {
        CheckoutSession {
            tx_ref: "ps-1".into(),
            checkout_url: url.into(),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = PaymentsApi::new("http://localhost:5000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_success_envelope_yields_session() {
        let envelope = Envelope::ok(session("https://checkout.chapa.co/pay/ps-1"));
        let session = session_from_envelope(envelope).unwrap();
        assert_eq!(session.tx_ref, "ps-1");
    }

    #[test]
    fn test_failure_envelope_carries_backend_message() {
        let envelope: Envelope<CheckoutSession> = Envelope::err("An email address is required");
        let err = session_from_envelope(envelope).unwrap_err();
        match err {
            FlowError::Rejected(message) => assert_eq!(message, "An email address is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_success_without_data_is_invalid() {
        let envelope = Envelope::<CheckoutSession> {
            success: true,
            data: None,
            error: None,
        };
        assert!(matches!(
            session_from_envelope(envelope),
            Err(FlowError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_blank_checkout_url_is_invalid() {
        let envelope = Envelope::ok(session("   "));
        assert!(matches!(
            session_from_envelope(envelope),
            Err(FlowError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_verification_reads_fail_closed() {
        let failure: Envelope<VerifiedTransaction> = Envelope::err("Transaction not found.");
        assert_eq!(status_from_envelope(failure), TransactionStatus::Failed);

        let empty = Envelope::<VerifiedTransaction> {
            success: true,
            data: None,
            error: None,
        };
        assert_eq!(status_from_envelope(empty), TransactionStatus::Failed);
    }

    #[test]
    fn test_verification_passes_through_status() {
        let verified = VerifiedTransaction {
            tx_ref: "ps-1".into(),
            status: TransactionStatus::Pending,
            amount: None,
            currency: None,
            email: None,
            raw: serde_json::Value::Null,
        };
        assert_eq!(
            status_from_envelope(Envelope::ok(verified)),
            TransactionStatus::Pending
        );
    }
}

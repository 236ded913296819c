//! Checkout Orchestration
//!
//! Sits between the HTTP surface and the gateway adapter. Validates
//! submissions, mints transaction references, replays idempotent
//! retries, and confirms webhook deliveries against the gateway before
//! any payment is recorded as paid.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{PaymentError, Result};
use crate::gateway::PaymentGateway;
use crate::store::{CheckoutStore, InitiatedCheckout};
use crate::types::{CheckoutSession, PaymentRequest, PaymentSubmission, VerifiedTransaction};
use crate::webhook::{WebhookDisposition, WebhookNotice};

/// Payment orchestration service
pub struct CheckoutService<S: CheckoutStore> {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<S>,
}

impl<S: CheckoutStore> CheckoutService<S> {
    pub fn new(gateway: Arc<dyn PaymentGateway>, store: Arc<S>) -> Self {
        Self { gateway, store }
    }

    /// Validate a submission and open a checkout session with the gateway.
    ///
    /// When an idempotency key accompanies the submission, a repeat of the
    /// same request replays the stored session without touching the gateway
    /// again. The same key with a different request is rejected.
    pub async fn initialize(
        &self,
        submission: PaymentSubmission,
        idempotency_key: Option<&str>,
    ) -> Result<CheckoutSession> {
        let request = submission.validate()?;
        let fingerprint = request_fingerprint(&request);

        let key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());
        if let Some(key) = key {
            if let Some(prior) = self.store.find_initiated(key)? {
                if prior.fingerprint == fingerprint {
                    tracing::info!(
                        tx_ref = %prior.session.tx_ref,
                        "Replaying checkout session for repeated idempotency key"
                    );
                    return Ok(prior.session);
                }
                return Err(PaymentError::Validation {
                    field: "idempotency-key",
                    reason: "Idempotency key was already used with a different request".into(),
                });
            }
        }

        let tx_ref = mint_tx_ref();
        tracing::info!(tx_ref = %tx_ref, plan = %request.plan, "Initializing checkout");

        let session = self.gateway.initialize(&request, &tx_ref).await?;

        if let Some(key) = key {
            self.store.save_initiated(&InitiatedCheckout {
                idempotency_key: key.to_string(),
                fingerprint,
                session: session.clone(),
                created_at: Utc::now(),
            })?;
        }

        Ok(session)
    }

    /// Look up a transaction's status with the gateway
    pub async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction> {
        let tx_ref = tx_ref.trim();
        if tx_ref.is_empty() {
            return Err(PaymentError::Validation {
                field: "tx_ref",
                reason: "Transaction reference is required".into(),
            });
        }

        self.gateway.verify(tx_ref).await
    }

    /// Process a webhook delivery.
    ///
    /// The sender's claim is never trusted: a success claim triggers a
    /// fresh verify call against the gateway, and only a confirmed paid
    /// status is recorded. Repeat deliveries for a confirmed transaction
    /// are reported but change nothing. This never returns an error; the
    /// HTTP layer acknowledges every delivery regardless of disposition.
    pub async fn process_webhook(&self, body: &str) -> WebhookDisposition {
        let Some(notice) = WebhookNotice::from_body(body) else {
            tracing::warn!("Webhook body was not a JSON object, ignoring");
            return WebhookDisposition::Ignored;
        };

        let tx_ref = notice
            .tx_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let Some(tx_ref) = tx_ref else {
            tracing::warn!("Webhook carried no transaction reference, ignoring");
            return WebhookDisposition::Ignored;
        };

        let claims_success = notice
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"));
        if !claims_success {
            tracing::info!(tx_ref, status = ?notice.status, "Webhook does not claim success, ignoring");
            return WebhookDisposition::Ignored;
        }

        let verified = match self.gateway.verify(tx_ref).await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::warn!(tx_ref, error = %e, "Could not verify webhook claim with gateway");
                return WebhookDisposition::VerifyFailed;
            }
        };

        if !verified.status.is_paid() {
            tracing::warn!(
                tx_ref,
                status = verified.status.as_str(),
                "Webhook claimed success but gateway disagrees"
            );
            return WebhookDisposition::NotConfirmed;
        }

        match self.store.mark_paid(tx_ref) {
            Ok(newly_paid) => {
                if newly_paid {
                    tracing::info!(tx_ref, "Payment confirmed");
                } else {
                    tracing::info!(tx_ref, "Repeat webhook for already-confirmed payment");
                }
                WebhookDisposition::Confirmed { newly_paid }
            }
            Err(e) => {
                tracing::error!(tx_ref, error = %e, "Failed to record confirmed payment");
                WebhookDisposition::VerifyFailed
            }
        }
    }

    /// Whether a transaction has been confirmed paid
    pub fn is_paid(&self, tx_ref: &str) -> Result<bool> {
        self.store.is_paid(tx_ref)
    }
}

/// Mint a transaction reference unique to this attempt
fn mint_tx_ref() -> String {
    format!("ps-{}", Uuid::new_v4().simple())
}

fn request_fingerprint(request: &PaymentRequest) -> u64 {
    let mut hasher = DefaultHasher::new();
    serde_json::to_string(request)
        .unwrap_or_default()
        .hash(&mut hasher);
    hasher.finish()
}

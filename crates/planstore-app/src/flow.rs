//! Checkout Flow
//!
//! Ties one purchase attempt together, from the filled-in form to the
//! recorded completion flag.

use planstore_payments::{CheckoutSession, PaymentSubmission};
use uuid::Uuid;

use crate::api::PaymentsApi;
use crate::catalog::PlanSelection;
use crate::checkout::{CheckoutOutcome, CheckoutWatcher};
use crate::error::{FlowError, Result};
use crate::status::CompletionStore;

/// Customer details from the checkout form
#[derive(Clone, Debug)]
pub struct CustomerInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// One purchase attempt.
///
/// The idempotency key is minted when the flow begins and sent with
/// every submit, so a retry after a dropped response lands on the same
/// gateway session. A changed form means a new flow, and a new key.
pub struct CheckoutFlow {
    selection: PlanSelection,
    customer: CustomerInfo,
    idempotency_key: String,
    session: Option<CheckoutSession>,
}

impl CheckoutFlow {
    pub fn begin(selection: PlanSelection, customer: CustomerInfo) -> Self {
        Self {
            selection,
            customer,
            idempotency_key: Uuid::new_v4().to_string(),
            session: None,
        }
    }

    pub fn selection(&self) -> &PlanSelection {
        &self.selection
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    pub fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    /// The submission this flow sends to the backend
    pub fn submission(&self) -> PaymentSubmission {
        PaymentSubmission {
            amount: Some(self.selection.total()),
            email: some_nonempty(&self.customer.email),
            first_name: some_nonempty(&self.customer.first_name),
            last_name: some_nonempty(&self.customer.last_name),
            plan: Some(self.selection.tier.title().to_string()),
        }
    }

    /// Run the same field checks the backend applies, before any request
    pub fn validate(&self) -> Result<()> {
        self.submission()
            .validate()
            .map(|_| ())
            .map_err(|e| FlowError::Invalid(e.user_message().to_string()))
    }

    /// Submit the payment and remember the session for the watcher
    pub async fn submit(&mut self, api: &PaymentsApi) -> Result<CheckoutSession> {
        self.validate()?;

        let session = api
            .initialize(&self.submission(), &self.idempotency_key)
            .await?;

        tracing::info!(tx_ref = %session.tx_ref, "Checkout session opened");
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Open a watcher on the submitted session's checkout page
    pub fn open_watcher(&self) -> Result<CheckoutWatcher> {
        let session = self.session.as_ref().ok_or(FlowError::InvalidCheckoutUrl)?;
        CheckoutWatcher::open(session.checkout_url.clone())
    }

    /// Record the watcher's outcome. Only a completion writes the flag.
    pub fn finish(&self, outcome: CheckoutOutcome, store: &dyn CompletionStore) -> Result<()> {
        match outcome {
            CheckoutOutcome::Completed => {
                store.record_success()?;
                tracing::info!(key = %self.idempotency_key, "Purchase flow completed");
            }
            CheckoutOutcome::Abandoned(reason) => {
                tracing::info!(reason = reason.as_str(), "Purchase flow closed without payment");
            }
        }
        Ok(())
    }

    /// Reset for a fresh attempt with a new key and no session
    pub fn restart(&mut self) {
        self.idempotency_key = Uuid::new_v4().to_string();
        self.session = None;
    }
}

fn some_nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AddOn, PlanTier};
    use crate::checkout::{AbandonReason, CheckoutPhase, SurfaceEvent};
    use crate::status::{CompletionStore, MemoryCompletionStore};
    use rust_decimal_macros::dec;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            email: "abebe@example.com".into(),
            first_name: "Abebe".into(),
            last_name: "Bikila".into(),
        }
    }

    fn flow() -> CheckoutFlow {
        let selection = PlanSelection::new(PlanTier::Basic).with_add_on(AddOn::MobileApp);
        CheckoutFlow::begin(selection, customer())
    }

    #[test]
    fn test_submission_carries_selection_total() {
        let submission = flow().submission();

        assert_eq!(submission.amount, Some(dec!(22500)));
        assert_eq!(submission.plan.as_deref(), Some("Basic Plan"));
        assert_eq!(submission.email.as_deref(), Some("abebe@example.com"));
    }

    #[test]
    fn test_blank_fields_become_absent() {
        let mut customer = customer();
        customer.first_name = "   ".into();
        let flow = CheckoutFlow::begin(PlanSelection::new(PlanTier::Basic), customer);

        assert!(flow.submission().first_name.is_none());
        let err = flow.validate().unwrap_err();
        assert!(matches!(err, FlowError::Invalid(_)));
    }

    #[test]
    fn test_validate_catches_bad_email() {
        let mut customer = customer();
        customer.email = "not-an-email".into();
        let flow = CheckoutFlow::begin(PlanSelection::new(PlanTier::Basic), customer);

        let err = flow.validate().unwrap_err();
        match err {
            FlowError::Invalid(message) => assert!(message.contains("email address")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_each_flow_mints_its_own_key() {
        let first = flow();
        let second = flow();
        assert_ne!(first.idempotency_key(), second.idempotency_key());
    }

    #[test]
    fn test_restart_rotates_key_and_drops_session() {
        let mut flow = flow();
        flow.session = Some(CheckoutSession {
            tx_ref: "ps-1".into(),
            checkout_url: "https://checkout.chapa.co/pay/ps-1".into(),
        });
        let old_key = flow.idempotency_key().to_string();

        flow.restart();

        assert_ne!(flow.idempotency_key(), old_key);
        assert!(flow.session().is_none());
    }

    #[test]
    fn test_watcher_needs_a_submitted_session() {
        let mut flow = flow();
        assert!(flow.open_watcher().is_err());

        flow.session = Some(CheckoutSession {
            tx_ref: "ps-1".into(),
            checkout_url: "https://checkout.chapa.co/pay/ps-1".into(),
        });

        let watcher = flow.open_watcher().unwrap();
        assert_eq!(watcher.checkout_url(), "https://checkout.chapa.co/pay/ps-1");
    }

    #[test]
    fn test_return_navigation_walks_through_to_the_flag() {
        let mut flow = flow();
        flow.session = Some(CheckoutSession {
            tx_ref: "ps-1".into(),
            checkout_url: "https://checkout.chapa.co/pay/ps-1".into(),
        });
        let store = MemoryCompletionStore::new();

        let mut watcher = flow.open_watcher().unwrap();
        watcher.on_event(SurfaceEvent::LoadStarted);
        watcher.on_event(SurfaceEvent::LoadFinished);
        assert_eq!(watcher.phase(), CheckoutPhase::Presenting);

        let outcome = watcher
            .on_event(SurfaceEvent::NavigationChanged(
                "http://localhost:5000/close-webview?ref=ps-1".into(),
            ))
            .unwrap();
        assert_eq!(watcher.phase(), CheckoutPhase::Completing);

        // The return page also posts the success message; the latch absorbs it.
        assert!(watcher
            .on_event(SurfaceEvent::MessagePosted("PAYMENT_SUCCESS".into()))
            .is_none());

        watcher.close();
        assert_eq!(watcher.phase(), CheckoutPhase::Closed);

        flow.finish(outcome, &store).unwrap();
        assert!(store.take_success().unwrap());
    }

    #[test]
    fn test_finish_records_only_completions() {
        let flow = flow();
        let store = MemoryCompletionStore::new();

        flow.finish(
            CheckoutOutcome::Abandoned(AbandonReason::Dismissed),
            &store,
        )
        .unwrap();
        assert!(!store.take_success().unwrap());

        flow.finish(CheckoutOutcome::Completed, &store).unwrap();
        assert!(store.take_success().unwrap());
    }
}

//! Mock Payment Gateway
//!
//! For tests and for running the server without gateway credentials.
//! Behavior is scripted per instance and every call is recorded.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::PaymentGateway;
use crate::error::{PaymentError, Result};
use crate::types::{CheckoutSession, PaymentRequest, TransactionStatus, VerifiedTransaction};

/// Message returned when scripted to reject
pub const REJECTION_MESSAGE: &str = "Charge was declined by the gateway";

/// Scripted response behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockBehavior {
    /// Operations succeed; verify reports the configured status for any
    /// reference this instance has seen
    Succeed,
    /// The gateway refuses every operation
    Reject,
    /// The gateway cannot be reached
    Unavailable,
}

/// Mock gateway with scripted behavior and call recording
pub struct MockGateway {
    behavior: MockBehavior,
    verify_status: TransactionStatus,
    refs: Mutex<HashSet<String>>,
    initialize_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    last_request: Mutex<Option<PaymentRequest>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Succeed)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            verify_status: TransactionStatus::Success,
            refs: Mutex::new(HashSet::new()),
            initialize_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Gateway that declines every operation
    pub fn rejecting() -> Self {
        Self::with_behavior(MockBehavior::Reject)
    }

    /// Gateway that cannot be reached
    pub fn unavailable() -> Self {
        Self::with_behavior(MockBehavior::Unavailable)
    }

    /// Status reported for known references on verify
    pub fn with_verify_status(mut self, status: TransactionStatus) -> Self {
        self.verify_status = status;
        self
    }

    /// Pre-register a transaction reference, as if initialized earlier
    pub fn seed_ref(&self, tx_ref: &str) {
        self.refs.lock().unwrap().insert(tx_ref.to_string());
    }

    /// How many times initialize was called
    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    /// How many times verify was called
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// The most recent initialize request
    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize(
        &self,
        request: &PaymentRequest,
        tx_ref: &str,
    ) -> Result<CheckoutSession> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match self.behavior {
            MockBehavior::Succeed => {
                self.refs.lock().unwrap().insert(tx_ref.to_string());
                Ok(CheckoutSession {
                    tx_ref: tx_ref.to_string(),
                    checkout_url: format!("https://checkout.chapa.test/pay/{tx_ref}"),
                })
            }
            MockBehavior::Reject => Err(PaymentError::GatewayRejected(REJECTION_MESSAGE.into())),
            MockBehavior::Unavailable => {
                Err(PaymentError::GatewayUnavailable("connection refused".into()))
            }
        }
    }

    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Succeed => {
                if !self.refs.lock().unwrap().contains(tx_ref) {
                    return Err(PaymentError::NotFound(tx_ref.to_string()));
                }
                Ok(VerifiedTransaction {
                    tx_ref: tx_ref.to_string(),
                    status: self.verify_status,
                    amount: None,
                    currency: None,
                    email: None,
                    raw: serde_json::Value::Null,
                })
            }
            MockBehavior::Reject => Err(PaymentError::GatewayRejected(REJECTION_MESSAGE.into())),
            MockBehavior::Unavailable => {
                Err(PaymentError::GatewayUnavailable("connection refused".into()))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

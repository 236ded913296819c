//! Payment Gateway Integration
//!
//! Abstractions and implementations for hosted-checkout payment gateways.

mod chapa;
mod mock;

pub use chapa::{ChapaConfig, ChapaGateway};
pub use mock::{MockBehavior, MockGateway, REJECTION_MESSAGE};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CheckoutSession, PaymentRequest, VerifiedTransaction};

/// Payment gateway trait (Strategy pattern)
///
/// Implement this for each hosted-checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for a validated request.
    ///
    /// `tx_ref` is the merchant reference the transaction will be known by
    /// on both sides from here on.
    async fn initialize(&self, request: &PaymentRequest, tx_ref: &str)
    -> Result<CheckoutSession>;

    /// Look up the authoritative status of a transaction
    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction>;

    /// Gateway name
    fn name(&self) -> &str;
}

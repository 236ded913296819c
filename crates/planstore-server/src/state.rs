//! Application State

use std::sync::Arc;

use planstore_payments::{MemoryCheckoutStore, PaymentGateway};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment gateway client (None if not configured)
    pub gateway: Option<Arc<dyn PaymentGateway>>,

    /// Checkout attempt store
    pub store: Arc<MemoryCheckoutStore>,

    /// Webhook signing secret (None disables the signature check)
    pub webhook_secret: Option<String>,
}

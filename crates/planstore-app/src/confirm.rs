//! Success Confirmation
//!
//! The storefront screen calls [`consume_completion`] when it becomes
//! active. Because the flag read clears it, the congratulations popup
//! appears exactly once per completed payment.

use std::time::Duration;

use crate::status::CompletionStore;

/// How long the popup stays up before dismissing itself
pub const AUTO_DISMISS: Duration = Duration::from_secs(3);

/// One-time popup shown after a completed payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuccessNotice {
    pub title: String,
    pub message: String,
    pub auto_dismiss: Duration,
}

impl SuccessNotice {
    fn new() -> Self {
        Self {
            title: "Payment Successful!".into(),
            message: "Thank you for your purchase. Your subscription is now active.".into(),
            auto_dismiss: AUTO_DISMISS,
        }
    }
}

/// Check for a completed payment and build the notice for it.
///
/// A storage problem is logged and shows nothing; it never blocks the
/// screen from rendering.
pub fn consume_completion(store: &dyn CompletionStore) -> Option<SuccessNotice> {
    match store.take_success() {
        Ok(true) => Some(SuccessNotice::new()),
        Ok(false) => None,
        Err(e) => {
            tracing::warn!("Could not read completion flag: {}", e);
            None
        }
    }
}

//! # planstore-payments
//!
//! Payment processing for the planstore storefront: request validation,
//! the Chapa hosted-checkout gateway adapter, idempotent checkout
//! orchestration and webhook reconciliation.
//!
//! ## Checkout flow
//!
//! ```text
//! ┌────────────┐ POST /payment ┌──────────────────┐  initialize  ┌────────┐
//! │ storefront │ ─────────────▶│  CheckoutService │ ────────────▶│ Chapa  │
//! │  (mobile)  │ ◀─────────────│ validate, dedupe │ ◀────────────│ hosted │
//! └────────────┘  checkout_url └──────────────────┘ checkout_url └────────┘
//!       │                                                            │
//!       │  customer pays on the hosted page; the storefront's        │
//!       │  webview watches for the completion signals                │
//!       ▼                                                            ▼
//!  completion flag                    webhook ──▶ re-verify ──▶ mark paid
//! ```
//!
//! The webhook path never trusts the notification body: the transaction
//! is re-verified against the gateway before anything is recorded, and
//! recording is idempotent per transaction reference.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use planstore_payments::{ChapaGateway, CheckoutService, MemoryCheckoutStore};
//!
//! let gateway = Arc::new(ChapaGateway::from_env()?);
//! let store = Arc::new(MemoryCheckoutStore::new());
//! let service = CheckoutService::new(gateway, store);
//!
//! let session = service.initialize(submission, Some("client-key")).await?;
//! // Present session.checkout_url to the customer
//! ```

mod error;
mod gateway;
mod service;
mod store;
mod types;
mod webhook;

pub use error::{PaymentError, Result};
pub use gateway::{
    ChapaConfig, ChapaGateway, MockBehavior, MockGateway, PaymentGateway, REJECTION_MESSAGE,
};
pub use service::CheckoutService;
pub use store::{CheckoutStore, InitiatedCheckout, MemoryCheckoutStore};
pub use types::{
    CheckoutSession, Envelope, PaymentRequest, PaymentSubmission, TransactionStatus,
    VerifiedTransaction,
};
pub use webhook::{verify_signature, WebhookDisposition, WebhookNotice, SIGNATURE_HEADERS};

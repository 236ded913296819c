//! # planstore-app
//!
//! Client library for the planstore storefront: the plan catalog, the
//! backend API client, and the hosted-checkout flow with its one-time
//! completion handoff.
//!
//! ## Completion channels
//!
//! The checkout page can announce a finished payment two ways, and
//! either may arrive first (or both, or twice):
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Hosted checkout page (WebView)                            │
//! ├────────────────────────────────────────────────────────────┤
//! │  channel 1: postMessage("PAYMENT_SUCCESS")  ──┐            │
//! │  channel 2: navigate to .../close-webview   ──┤            │
//! └───────────────────────────────────────────────┼────────────┘
//!                                                 v
//!                                    CheckoutWatcher (latch:
//!                                    first signal wins, the
//!                                    rest are ignored)
//!                                                 v
//!                                    CompletionStore
//!                                    paymentStatus = "success"
//!                                                 v
//!                                    storefront screen reads and
//!                                    clears the flag, shows the
//!                                    popup once
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use planstore_app::{
//!     consume_completion, CheckoutFlow, CustomerInfo, MemoryCompletionStore,
//!     PaymentsApi, PlanSelection, PlanTier, SurfaceEvent, DEFAULT_TIMEOUT,
//! };
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> planstore_app::Result<()> {
//! let api = PaymentsApi::new("http://localhost:5000")?;
//! let store = MemoryCompletionStore::new();
//!
//! let mut flow = CheckoutFlow::begin(
//!     PlanSelection::new(PlanTier::Basic),
//!     CustomerInfo {
//!         email: "abebe@example.com".into(),
//!         first_name: "Abebe".into(),
//!         last_name: "Bikila".into(),
//!     },
//! );
//!
//! flow.submit(&api).await?;
//! let mut watcher = flow.open_watcher()?;
//!
//! // The UI layer forwards WebView events into this channel.
//! let (events_tx, mut events_rx) = mpsc::channel::<SurfaceEvent>(16);
//! let outcome = watcher.drive(&mut events_rx, DEFAULT_TIMEOUT).await;
//! flow.finish(outcome, &store)?;
//!
//! // Later, when the storefront screen comes back into focus:
//! if let Some(notice) = consume_completion(&store) {
//!     println!("{}", notice.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod confirm;
pub mod error;
pub mod flow;
pub mod status;

pub use api::PaymentsApi;
pub use catalog::{AddOn, PlanSelection, PlanTier, CURRENCY};
pub use checkout::{
    AbandonReason, CheckoutOutcome, CheckoutPhase, CheckoutWatcher, SurfaceEvent,
    CLOSE_URL_MARKER, DEFAULT_TIMEOUT, SUCCESS_MESSAGE,
};
pub use confirm::{consume_completion, SuccessNotice, AUTO_DISMISS};
pub use error::{FlowError, Result};
pub use flow::{CheckoutFlow, CustomerInfo};
pub use status::{
    CompletionStore, FileCompletionStore, MemoryCompletionStore, STATUS_KEY, STATUS_SUCCESS,
};

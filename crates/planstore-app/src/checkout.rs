//! Checkout Surface Watcher
//!
//! Tracks the in-app WebView that hosts the gateway's checkout page.
//! Completion arrives over two channels, either of which may fire
//! first (or both): a `PAYMENT_SUCCESS` message posted from the return
//! page, and a navigation to a URL containing `/close-webview`. The
//! watcher latches on the first signal; everything after it is noise.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{FlowError, Result};

/// Message the return page posts on completion
pub const SUCCESS_MESSAGE: &str = "PAYMENT_SUCCESS";

/// URL fragment that marks the checkout return navigation
pub const CLOSE_URL_MARKER: &str = "/close-webview";

/// How long a checkout may sit open before it is abandoned
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Raw events reported by the hosting surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    LoadStarted,
    LoadFinished,
    /// Message posted from the page via the WebView bridge
    MessagePosted(String),
    /// The page navigated to a new URL
    NavigationChanged(String),
    /// The page failed to load
    LoadFailed(String),
    /// The user closed the surface
    Dismissed,
}

/// Where the checkout surface currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    Loading,
    Presenting,
    Completing,
    Closed,
}

/// Why a checkout ended without payment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbandonReason {
    Dismissed,
    LoadFailed,
    TimedOut,
    SurfaceClosed,
}

impl AbandonReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbandonReason::Dismissed => "dismissed",
            AbandonReason::LoadFailed => "load_failed",
            AbandonReason::TimedOut => "timed_out",
            AbandonReason::SurfaceClosed => "surface_closed",
        }
    }
}

/// Final result of one checkout attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed,
    Abandoned(AbandonReason),
}

/// One checkout attempt inside the hosted surface.
///
/// The outcome is a one-shot latch: once set, no later event can
/// change it, only close the surface.
pub struct CheckoutWatcher {
    checkout_url: String,
    phase: CheckoutPhase,
    outcome: Option<CheckoutOutcome>,
}

impl CheckoutWatcher {
    /// Start watching a checkout session at the given hosted URL
    pub fn open(checkout_url: impl Into<String>) -> Result<Self> {
        let checkout_url = checkout_url.into();
        if checkout_url.trim().is_empty() {
            return Err(FlowError::InvalidCheckoutUrl);
        }

        tracing::info!(checkout_url = %checkout_url, "Opening checkout surface");
        Ok(Self {
            checkout_url,
            phase: CheckoutPhase::Idle,
            outcome: None,
        })
    }

    pub fn checkout_url(&self) -> &str {
        &self.checkout_url
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<CheckoutOutcome> {
        self.outcome
    }

    /// Feed one surface event through the state machine.
    ///
    /// Returns the outcome at the moment it is decided, and None for
    /// every other event, including anything after the latch is set.
    pub fn on_event(&mut self, event: SurfaceEvent) -> Option<CheckoutOutcome> {
        if self.outcome.is_some() {
            if matches!(event, SurfaceEvent::Dismissed) {
                self.phase = CheckoutPhase::Closed;
            }
            return None;
        }

        match event {
            SurfaceEvent::LoadStarted => {
                self.phase = CheckoutPhase::Loading;
                None
            }
            SurfaceEvent::LoadFinished => {
                self.phase = CheckoutPhase::Presenting;
                None
            }
            SurfaceEvent::MessagePosted(message) => {
                if message == SUCCESS_MESSAGE {
                    Some(self.complete())
                } else {
                    tracing::debug!(%message, "Ignoring unrecognized message from checkout page");
                    None
                }
            }
            SurfaceEvent::NavigationChanged(url) => {
                if url.contains(CLOSE_URL_MARKER) {
                    Some(self.complete())
                } else {
                    None
                }
            }
            SurfaceEvent::LoadFailed(description) => {
                tracing::warn!(%description, "Checkout page failed to load");
                Some(self.abandon(AbandonReason::LoadFailed))
            }
            SurfaceEvent::Dismissed => Some(self.abandon(AbandonReason::Dismissed)),
        }
    }

    /// Consume events until an outcome is decided or the timeout lapses
    pub async fn drive(
        &mut self,
        events: &mut mpsc::Receiver<SurfaceEvent>,
        timeout: Duration,
    ) -> CheckoutOutcome {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    return self.abandon(AbandonReason::TimedOut);
                }
                event = events.recv() => match event {
                    Some(event) => {
                        if let Some(outcome) = self.on_event(event) {
                            return outcome;
                        }
                    }
                    None => return self.abandon(AbandonReason::SurfaceClosed),
                },
            }
        }
    }

    /// Mark the surface closed without touching the outcome
    pub fn close(&mut self) {
        self.phase = CheckoutPhase::Closed;
    }

    fn complete(&mut self) -> CheckoutOutcome {
        if let Some(existing) = self.outcome {
            return existing;
        }

        self.outcome = Some(CheckoutOutcome::Completed);
        self.phase = CheckoutPhase::Completing;
        tracing::info!("Checkout completion signaled");
        CheckoutOutcome::Completed
    }

    fn abandon(&mut self, reason: AbandonReason) -> CheckoutOutcome {
        if let Some(existing) = self.outcome {
            self.phase = CheckoutPhase::Closed;
            return existing;
        }

        let outcome = CheckoutOutcome::Abandoned(reason);
        self.outcome = Some(outcome);
        self.phase = CheckoutPhase::Closed;
        tracing::warn!(reason = reason.as_str(), "Checkout abandoned without payment");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watcher() -> CheckoutWatcher {
        CheckoutWatcher::open("https://checkout.chapa.co/pay/ps-1").unwrap()
    }

    #[test]
    fn test_open_rejects_blank_url() {
        assert!(matches!(
            CheckoutWatcher::open("  "),
            Err(FlowError::InvalidCheckoutUrl)
        ));
    }

    #[test]
    fn test_phases_walk_through_loading() {
        let mut watcher = watcher();
        assert_eq!(watcher.phase(), CheckoutPhase::Idle);

        assert!(watcher.on_event(SurfaceEvent::LoadStarted).is_none());
        assert_eq!(watcher.phase(), CheckoutPhase::Loading);

        assert!(watcher.on_event(SurfaceEvent::LoadFinished).is_none());
        assert_eq!(watcher.phase(), CheckoutPhase::Presenting);
    }

    #[test]
    fn test_posted_message_completes() {
        let mut watcher = watcher();
        let outcome = watcher.on_event(SurfaceEvent::MessagePosted(SUCCESS_MESSAGE.into()));

        assert_eq!(outcome, Some(CheckoutOutcome::Completed));
        assert_eq!(watcher.phase(), CheckoutPhase::Completing);
    }

    #[test]
    fn test_return_navigation_completes() {
        let mut watcher = watcher();
        let url = "http://localhost:5000/close-webview?trx=ps-1";
        let outcome = watcher.on_event(SurfaceEvent::NavigationChanged(url.into()));

        assert_eq!(outcome, Some(CheckoutOutcome::Completed));
    }

    #[test]
    fn test_second_signal_is_swallowed_by_latch() {
        let url = "http://localhost:5000/close-webview";

        // Message first, navigation second.
        let mut watcher = watcher();
        watcher.on_event(SurfaceEvent::MessagePosted(SUCCESS_MESSAGE.into()));
        assert!(watcher.on_event(SurfaceEvent::NavigationChanged(url.into())).is_none());
        assert_eq!(watcher.outcome(), Some(CheckoutOutcome::Completed));

        // Navigation first, message second.
        let mut watcher = self::watcher();
        watcher.on_event(SurfaceEvent::NavigationChanged(url.into()));
        assert!(watcher
            .on_event(SurfaceEvent::MessagePosted(SUCCESS_MESSAGE.into()))
            .is_none());
        assert_eq!(watcher.outcome(), Some(CheckoutOutcome::Completed));
    }

    #[test]
    fn test_stray_signals_are_ignored() {
        let mut watcher = watcher();

        assert!(watcher
            .on_event(SurfaceEvent::MessagePosted("telemetry-ping".into()))
            .is_none());
        assert!(watcher
            .on_event(SurfaceEvent::NavigationChanged(
                "https://checkout.chapa.co/pay/ps-1/card".into()
            ))
            .is_none());
        assert!(watcher.outcome().is_none());
    }

    #[test]
    fn test_dismiss_before_completion_abandons() {
        let mut watcher = watcher();
        let outcome = watcher.on_event(SurfaceEvent::Dismissed);

        assert_eq!(
            outcome,
            Some(CheckoutOutcome::Abandoned(AbandonReason::Dismissed))
        );
        assert_eq!(watcher.phase(), CheckoutPhase::Closed);
    }

    #[test]
    fn test_dismiss_after_completion_keeps_outcome() {
        let mut watcher = watcher();
        watcher.on_event(SurfaceEvent::MessagePosted(SUCCESS_MESSAGE.into()));

        assert!(watcher.on_event(SurfaceEvent::Dismissed).is_none());
        assert_eq!(watcher.outcome(), Some(CheckoutOutcome::Completed));
        assert_eq!(watcher.phase(), CheckoutPhase::Closed);
    }

    #[test]
    fn test_load_failure_abandons() {
        let mut watcher = watcher();
        watcher.on_event(SurfaceEvent::LoadStarted);
        let outcome = watcher.on_event(SurfaceEvent::LoadFailed("net::ERR_FAILED".into()));

        assert_eq!(
            outcome,
            Some(CheckoutOutcome::Abandoned(AbandonReason::LoadFailed))
        );
    }

    #[tokio::test]
    async fn test_drive_returns_on_completion() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(SurfaceEvent::LoadStarted).await.unwrap();
        tx.send(SurfaceEvent::LoadFinished).await.unwrap();
        tx.send(SurfaceEvent::MessagePosted(SUCCESS_MESSAGE.into()))
            .await
            .unwrap();

        let mut watcher = watcher();
        let outcome = watcher.drive(&mut rx, Duration::from_secs(5)).await;

        assert_eq!(outcome, CheckoutOutcome::Completed);
    }

    #[tokio::test]
    async fn test_drive_times_out() {
        let (tx, mut rx) = mpsc::channel::<SurfaceEvent>(1);

        let mut watcher = watcher();
        let outcome = watcher.drive(&mut rx, Duration::from_millis(50)).await;

        assert_eq!(outcome, CheckoutOutcome::Abandoned(AbandonReason::TimedOut));
        drop(tx);
    }

    #[tokio::test]
    async fn test_drive_handles_surface_going_away() {
        let (tx, mut rx) = mpsc::channel::<SurfaceEvent>(1);
        drop(tx);

        let mut watcher = watcher();
        let outcome = watcher.drive(&mut rx, Duration::from_secs(5)).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Abandoned(AbandonReason::SurfaceClosed)
        );
    }
}

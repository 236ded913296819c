//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    Json,
};
use serde::Serialize;

use planstore_payments::{
    verify_signature, CheckoutService, CheckoutSession, Envelope, PaymentError,
    PaymentSubmission, VerifiedTransaction, SIGNATURE_HEADERS,
};

use crate::state::AppState;

pub const SERVICE_NAME: &str = "planstore-payment-api";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

/// Error responses keep the same envelope shape as successes
pub type ApiError = (StatusCode, Json<Envelope<()>>);

fn error_response(err: &PaymentError) -> ApiError {
    let status = match err {
        PaymentError::Validation { .. } => StatusCode::BAD_REQUEST,
        PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
        PaymentError::GatewayUnavailable(_) | PaymentError::GatewayRejected(_) => {
            StatusCode::BAD_GATEWAY
        }
        PaymentError::Config(_) | PaymentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(Envelope::err(err.user_message())))
}

fn payments_disabled() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(Envelope::err("Payments are not configured")),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        service: SERVICE_NAME,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Initialize a checkout session
///
/// The body is taken raw so malformed JSON still gets an envelope-shaped
/// error instead of axum's plain-text rejection.
pub async fn initialize_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Envelope<CheckoutSession>>, ApiError> {
    let gateway = state.gateway.clone().ok_or_else(payments_disabled)?;

    let submission: PaymentSubmission = serde_json::from_str(&body).map_err(|e| {
        tracing::warn!("Rejecting unreadable payment body: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(Envelope::err("Invalid request body")),
        )
    })?;

    let idempotency_key = headers.get("idempotency-key").and_then(|v| v.to_str().ok());

    let service = CheckoutService::new(gateway, state.store.clone());
    let session = service
        .initialize(submission, idempotency_key)
        .await
        .map_err(|e| {
            tracing::warn!("Payment initialization failed: {}", e);
            error_response(&e)
        })?;

    Ok(Json(Envelope::ok(session)))
}

/// Verify a transaction's status with the gateway
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(tx_ref): Path<String>,
) -> Result<Json<Envelope<VerifiedTransaction>>, ApiError> {
    let gateway = state.gateway.clone().ok_or_else(payments_disabled)?;

    let service = CheckoutService::new(gateway, state.store.clone());
    let verified = service.verify(&tx_ref).await.map_err(|e| {
        tracing::warn!(tx_ref, "Verification failed: {}", e);
        error_response(&e)
    })?;

    Ok(Json(Envelope::ok(verified)))
}

/// Gateway webhook endpoint
///
/// Always acknowledges with 200 so the gateway does not redeliver;
/// every disposition short of confirmation is handled by logging.
pub async fn chapa_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Json<Envelope<()>> {
    let Some(gateway) = state.gateway.clone() else {
        tracing::warn!("Webhook received while payments are disabled");
        return Json(Envelope::accepted());
    };

    if let Some(secret) = state.webhook_secret.as_deref() {
        let signature = SIGNATURE_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .and_then(|v| v.to_str().ok());

        let accepted = signature.is_some_and(|sig| verify_signature(secret, &body, sig));
        if !accepted {
            tracing::warn!("Rejecting webhook with missing or invalid signature");
            return Json(Envelope::accepted());
        }
    }

    let service = CheckoutService::new(gateway, state.store.clone());
    let disposition = service.process_webhook(&body).await;
    tracing::debug!(?disposition, "Webhook processed");

    Json(Envelope::accepted())
}

/// Return page loaded inside the checkout WebView after payment.
///
/// Signals completion over both channels the app listens on: the URL
/// itself (the path is matched on navigation) and a posted message.
pub async fn close_webview() -> Html<&'static str> {
    Html(CLOSE_WEBVIEW_PAGE)
}

const CLOSE_WEBVIEW_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Payment Complete</title>
</head>
<body>
  <p>Payment complete. Returning to the app...</p>
  <script>
    if (window.ReactNativeWebView) {
      window.ReactNativeWebView.postMessage("PAYMENT_SUCCESS");
    }
  </script>
</body>
</html>
"#;

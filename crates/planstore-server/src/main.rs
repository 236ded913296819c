//! planstore Payment Server
//!
//! Axum-based backend for the planstore storefront. The app never holds
//! the gateway secret key; every Chapa call goes through this server.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planstore_payments::{ChapaConfig, ChapaGateway, MemoryCheckoutStore, PaymentGateway};

use crate::handlers::{
    chapa_webhook, close_webview, health_check, initialize_payment, verify_payment,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let public_base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".into());

    // Initialize the payment gateway
    let gateway: Option<Arc<dyn PaymentGateway>> = match ChapaConfig::from_env() {
        Ok(config) => {
            let config = config
                .with_return_url(format!("{public_base_url}/close-webview"))
                .with_callback_url(format!("{public_base_url}/api/webhook/chapa"));
            match ChapaGateway::new(config) {
                Ok(client) => {
                    tracing::info!("✓ Chapa configured");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::warn!("⚠ Chapa client failed to start: {} - payments disabled", e);
                    None
                }
            }
        }
        Err(_) => {
            tracing::warn!("⚠ Chapa not configured - payments disabled");
            tracing::warn!("  Set CHAPA_SECRET_KEY in .env");
            None
        }
    };

    let webhook_secret = std::env::var("CHAPA_WEBHOOK_SECRET").ok();
    if webhook_secret.is_none() {
        tracing::warn!("⚠ CHAPA_WEBHOOK_SECRET not set - webhook signatures not checked");
    }

    // Build application state
    let state = AppState {
        gateway,
        store: Arc::new(MemoryCheckoutStore::new()),
        webhook_secret,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & checkout return page
        .route("/health", get(health_check))
        .route("/close-webview", get(close_webview))

        // Payments
        .route("/payment", post(initialize_payment))
        .route("/api/payment", post(initialize_payment))
        .route("/api/verify/{tx_ref}", get(verify_payment))
        .route("/api/webhook/chapa", post(chapa_webhook))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 planstore payment server on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  POST /payment             - Initialize checkout");
    tracing::info!("  POST /api/payment         - Initialize checkout");
    tracing::info!("  GET  /api/verify/{{tx_ref}} - Verify transaction");
    tracing::info!("  POST /api/webhook/chapa   - Gateway webhook");
    tracing::info!("  GET  /close-webview       - Checkout return page");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

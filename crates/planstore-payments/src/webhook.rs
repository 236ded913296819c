//! Webhook Notices
//!
//! Parsing and signature checking for gateway webhook deliveries. A
//! notice is only ever a hint: confirmation requires a fresh verify
//! call against the gateway, which the service layer performs.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header names the gateway is known to sign deliveries under
pub const SIGNATURE_HEADERS: [&str; 2] = ["chapa-signature", "x-chapa-signature"];

/// Payload of a webhook delivery (untrusted)
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookNotice {
    /// Transaction reference; the gateway has used both spellings
    #[serde(default, alias = "trx_ref")]
    pub tx_ref: Option<String>,

    /// Status claimed by the sender
    #[serde(default)]
    pub status: Option<String>,
}

impl WebhookNotice {
    /// Parse a raw webhook body. None if the body is not a JSON object.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Outcome of processing a webhook delivery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// Verified paid with the gateway and recorded
    Confirmed { newly_paid: bool },

    /// No actionable claim (missing tx_ref or non-success status)
    Ignored,

    /// Sender claimed success but the gateway did not confirm it
    NotConfirmed,

    /// Verification against the gateway failed
    VerifyFailed,
}

/// Check an HMAC-SHA256 hex signature over the raw request body
pub fn verify_signature(secret: &str, body: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

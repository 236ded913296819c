//! Checkout Attempt Store
//!
//! Tracks initiated checkout attempts for idempotent replay and records
//! which transactions have been confirmed paid.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::CheckoutSession;

/// A checkout attempt recorded at initialize time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitiatedCheckout {
    /// Client-minted idempotency key
    pub idempotency_key: String,

    /// Fingerprint of the request the key was first used with
    pub fingerprint: u64,

    /// Session returned to the client
    pub session: CheckoutSession,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Checkout storage trait
pub trait CheckoutStore: Send + Sync {
    /// Record an initiated attempt under its idempotency key
    fn save_initiated(&self, record: &InitiatedCheckout) -> Result<()>;

    /// Look up a prior attempt by idempotency key
    fn find_initiated(&self, idempotency_key: &str) -> Result<Option<InitiatedCheckout>>;

    /// Mark a transaction as paid; true only the first time
    fn mark_paid(&self, tx_ref: &str) -> Result<bool>;

    /// Whether a transaction has already been marked paid
    fn is_paid(&self, tx_ref: &str) -> Result<bool>;
}

/// In-memory checkout store (for development)
pub struct MemoryCheckoutStore {
    initiated: RwLock<HashMap<String, InitiatedCheckout>>,
    paid: RwLock<HashSet<String>>,
}

impl Default for MemoryCheckoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCheckoutStore {
    pub fn new() -> Self {
        Self {
            initiated: RwLock::new(HashMap::new()),
            paid: RwLock::new(HashSet::new()),
        }
    }
}

impl CheckoutStore for MemoryCheckoutStore {
    fn save_initiated(&self, record: &InitiatedCheckout) -> Result<()> {
        let mut initiated = self.initiated.write().unwrap();
        initiated.insert(record.idempotency_key.clone(), record.clone());
        Ok(())
    }

    fn find_initiated(&self, idempotency_key: &str) -> Result<Option<InitiatedCheckout>> {
        let initiated = self.initiated.read().unwrap();
        Ok(initiated.get(idempotency_key).cloned())
    }

    fn mark_paid(&self, tx_ref: &str) -> Result<bool> {
        let mut paid = self.paid.write().unwrap();
        Ok(paid.insert(tx_ref.to_string()))
    }

    fn is_paid(&self, tx_ref: &str) -> Result<bool> {
        let paid = self.paid.read().unwrap();
        Ok(paid.contains(tx_ref))
    }
}

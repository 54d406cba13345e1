//! Integration tests for Pocket Cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pocket-cart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Store operations against a shared backend
//! - `cart_provider` - Scoped accessor and fire-and-forget writes
//! - `file_persistence` - Round trips through the file backend
//!
//! This library holds the shared fixtures: a backend that records writes and
//! can be switched into a failing mode, and a few catalog items.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use pocket_cart_core::{CartItem, Price, Snapshot};
use pocket_cart_store::{
    CartStore, MemoryBackend, PRODUCTS_KEY, PersistenceBackend, PersistenceError, StoreOptions,
};

/// Memory backend that counts writes and can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    writes: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl RecordingBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent `set` calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw blob stored under the cart key.
    pub async fn blob(&self) -> Option<String> {
        self.inner.get(PRODUCTS_KEY).await.ok().flatten()
    }

    /// Persisted cart parsed back into a snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the stored blob is not a valid cart.
    #[allow(clippy::expect_used)]
    pub async fn persisted(&self) -> Option<Snapshot> {
        self.blob()
            .await
            .map(|blob| serde_json::from_str(&blob).expect("persisted cart should parse"))
    }

    /// Fresh store on this backend, not yet hydrated.
    #[must_use]
    pub fn store(&self) -> CartStore {
        CartStore::new(Arc::new(self.clone()), StoreOptions::default())
    }
}

#[async_trait]
impl PersistenceBackend for RecordingBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("simulated outage".to_string()));
        }
        self.inner.set(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The shirt from the product catalog.
#[must_use]
pub fn shirt() -> CartItem {
    CartItem::new("A", "Shirt", "u", Price::from_cents(1000))
}

/// The hat from the product catalog.
#[must_use]
pub fn hat() -> CartItem {
    CartItem::new("B", "Hat", "v", Price::from_cents(550))
}

/// Ids and quantities of a snapshot, in cart order.
#[must_use]
pub fn quantities(cart: &Snapshot) -> Vec<(String, u32)> {
    cart.iter()
        .map(|e| (e.id.to_string(), e.quantity.get()))
        .collect()
}

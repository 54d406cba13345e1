//! Scoped access to a cart for UI code.
//!
//! A [`CartProvider`] makes one store reachable from everything running
//! inside [`CartProvider::scope`]; [`use_cart`] looks it up. Code that runs
//! outside any scope (including tasks spawned from inside one, which do not
//! inherit it) gets [`CartError::OutsideProvider`].

use std::future::Future;
use std::sync::Arc;

use pocket_cart_core::{CartItem, Change, ProductId, Snapshot};
use tokio::runtime::{Builder, Handle};
use tokio::sync::watch;

use crate::error::{CartError, Result};
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartHandle;
}

/// Handle to the cart for UI consumers.
///
/// Mutations apply to the in-memory cart immediately and schedule the
/// persistence write in the background, so event handlers never wait on
/// storage. Use [`CartHandle::flush`] to wait for the write.
///
/// The write runs on the caller's runtime, else on the runtime the handle
/// was created in. With neither available it runs to completion on a
/// temporary runtime before the mutation returns.
#[derive(Debug, Clone)]
pub struct CartHandle {
    store: Arc<CartStore>,
    runtime: Option<Handle>,
}

impl CartHandle {
    /// Wrap a store, remembering the current runtime (if any) for writes.
    #[must_use]
    pub fn new(store: Arc<CartStore>) -> Self {
        Self {
            store,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Wrap a store, spawning writes on `runtime` when the caller has none.
    #[must_use]
    pub const fn with_runtime(store: Arc<CartStore>, runtime: Handle) -> Self {
        Self {
            store,
            runtime: Some(runtime),
        }
    }

    /// Current cart contents.
    #[must_use]
    pub fn products(&self) -> Snapshot {
        self.store.products()
    }

    /// Add one unit of `item`.
    pub fn add_to_cart(&self, item: CartItem) -> Option<Change> {
        let change = self.store.apply_add(item);
        self.schedule_write(change)
    }

    /// Add one unit to the entry for `id`.
    pub fn increment(&self, id: &ProductId) -> Option<Change> {
        let change = self.store.apply_increment(id);
        self.schedule_write(change)
    }

    /// Remove one unit from the entry for `id`.
    pub fn decrement(&self, id: &ProductId) -> Option<Change> {
        let change = self.store.apply_decrement(id);
        self.schedule_write(change)
    }

    /// Receive every new snapshot, e.g. to re-render.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.store.subscribe()
    }

    /// Wait until the current cart is written to the backend.
    ///
    /// # Errors
    ///
    /// Returns the persistence error if the write fails.
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    fn schedule_write(&self, change: Option<Change>) -> Option<Change> {
        if change.is_none() {
            return None;
        }

        if let Some(runtime) = Handle::try_current().ok().or_else(|| self.runtime.clone()) {
            let store = Arc::clone(&self.store);
            runtime.spawn(async move { store.write_through().await });
            return change;
        }

        match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(self.store.write_through()),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.store.key(), "No async runtime, cart write skipped");
            }
        }
        change
    }
}

/// Makes a cart available to the code it wraps.
#[derive(Debug, Clone)]
pub struct CartProvider {
    handle: CartHandle,
}

impl CartProvider {
    /// Create a provider for `store`. See [`CartHandle::new`].
    #[must_use]
    pub fn new(store: Arc<CartStore>) -> Self {
        Self {
            handle: CartHandle::new(store),
        }
    }

    /// Create a provider whose writes fall back to `runtime`.
    #[must_use]
    pub const fn with_runtime(store: Arc<CartStore>, runtime: Handle) -> Self {
        Self {
            handle: CartHandle::with_runtime(store, runtime),
        }
    }

    /// Handle to the provided cart.
    #[must_use]
    pub fn handle(&self) -> CartHandle {
        self.handle.clone()
    }

    /// Run `body` with this cart in scope.
    pub async fn scope<F: Future>(&self, body: F) -> F::Output {
        CURRENT_CART.scope(self.handle.clone(), body).await
    }

    /// Run synchronous `body` with this cart in scope.
    pub fn sync_scope<R>(&self, body: impl FnOnce() -> R) -> R {
        CURRENT_CART.sync_scope(self.handle.clone(), body)
    }
}

/// The cart of the enclosing [`CartProvider`].
///
/// # Errors
///
/// Returns [`CartError::OutsideProvider`] when called outside any provider scope.
pub fn use_cart() -> Result<CartHandle> {
    CURRENT_CART
        .try_with(CartHandle::clone)
        .map_err(|_| CartError::OutsideProvider)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pocket_cart_core::Price;

    use std::time::Duration;

    use super::*;
    use crate::persistence::{MemoryBackend, PersistenceBackend};
    use crate::store::{PRODUCTS_KEY, StoreOptions};

    fn provider() -> CartProvider {
        let store = CartStore::new(Arc::new(MemoryBackend::new()), StoreOptions::default());
        CartProvider::new(Arc::new(store))
    }

    #[test]
    fn test_use_cart_outside_scope_fails() {
        assert!(matches!(use_cart(), Err(CartError::OutsideProvider)));
    }

    #[test]
    fn test_sync_scope_resolves_cart() {
        let provider = provider();
        let len = provider.sync_scope(|| use_cart().map(|cart| cart.products().len()));
        assert_eq!(len.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_async_scope_shares_store() {
        let provider = provider();

        provider
            .scope(async {
                let cart = use_cart().unwrap();
                cart.add_to_cart(CartItem::new("A", "Shirt", "u", Price::from_cents(1000)));
            })
            .await;

        assert_eq!(provider.handle().products().len(), 1);
    }

    #[tokio::test]
    async fn test_spawned_task_is_outside_scope() {
        let provider = provider();

        let outcome = provider
            .scope(async { tokio::spawn(async { use_cart().is_err() }).await.unwrap() })
            .await;
        assert!(outcome);
    }

    #[test]
    fn test_writes_fall_back_to_given_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let backend = MemoryBackend::new();
        let store = CartStore::new(Arc::new(backend.clone()), StoreOptions::default());
        let provider = CartProvider::with_runtime(Arc::new(store), runtime.handle().clone());

        provider.sync_scope(|| {
            use_cart()
                .unwrap()
                .add_to_cart(CartItem::new("A", "Shirt", "u", Price::from_cents(1000)))
        });

        let blob = runtime.block_on(async {
            tokio::time::timeout(Duration::from_secs(5), async {
                loop {
                    if let Some(blob) = backend.get(PRODUCTS_KEY).await.unwrap() {
                        return blob;
                    }
                    tokio::task::yield_now().await;
                }
            })
            .await
            .unwrap()
        });
        let persisted: Snapshot = serde_json::from_str(&blob).unwrap();
        assert_eq!(persisted, provider.handle().products());
    }
}

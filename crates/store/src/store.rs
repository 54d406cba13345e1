//! The cart store: one snapshot in memory, mirrored to a persistence backend.
//!
//! Every mutation swaps in a new [`Snapshot`] first and writes the full
//! serialized cart afterwards, so readers never wait on storage. The watch
//! channel holding the snapshot doubles as the change feed for UI consumers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pocket_cart_core::{CartEntry, CartItem, Change, ProductId, Snapshot};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::error::{CartError, Result};
use crate::persistence::PersistenceBackend;

/// Default key the cart blob is stored under.
pub const PRODUCTS_KEY: &str = "@cart:products";

/// What hydration does when the persisted blob cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HydrationPolicy {
    /// Return `CartError::MalformedSnapshot` and keep the cart empty.
    ///
    /// The malformed blob is left in place: writes fail with
    /// `CartError::Unhydrated` until a later hydration succeeds, while the
    /// in-memory cart stays usable.
    #[default]
    Fail,
    /// Log a warning and start with an empty cart.
    Discard,
}

impl FromStr for HydrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "discard" => Ok(Self::Discard),
            other => Err(format!("expected `fail` or `discard`, got `{other}`")),
        }
    }
}

/// Options for constructing a [`CartStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Key the cart blob is stored under.
    pub key: String,
    /// Hydration behavior for malformed persisted data.
    pub on_malformed: HydrationPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: PRODUCTS_KEY.to_string(),
            on_malformed: HydrationPolicy::default(),
        }
    }
}

/// Cart state with write-through persistence.
///
/// Construct one per cart with [`CartStore::new`] (empty, not yet hydrated)
/// or [`CartStore::open`] (hydrated), then share it behind an `Arc`.
pub struct CartStore {
    backend: Arc<dyn PersistenceBackend>,
    options: StoreOptions,
    state: watch::Sender<Snapshot>,
    hydrated: AtomicBool,
    /// Set while the persisted blob is malformed and must not be overwritten.
    rejected: AtomicBool,
    mutated: AtomicBool,
    /// Held for the whole of a hydration so concurrent callers wait for it.
    hydrate_gate: Mutex<()>,
    /// Serializes backend writes so the last write always carries the latest snapshot.
    write_gate: Mutex<()>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.options.key)
            .field("entries", &self.state.borrow().len())
            .field("hydrated", &self.hydrated.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store with an empty cart. Call [`CartStore::hydrate`] to load
    /// the persisted cart.
    #[must_use]
    pub fn new(backend: Arc<dyn PersistenceBackend>, options: StoreOptions) -> Self {
        let (state, _) = watch::channel(Snapshot::empty());
        Self {
            backend,
            options,
            state,
            hydrated: AtomicBool::new(false),
            rejected: AtomicBool::new(false),
            mutated: AtomicBool::new(false),
            hydrate_gate: Mutex::new(()),
            write_gate: Mutex::new(()),
        }
    }

    /// Create a store and hydrate it from the backend.
    ///
    /// # Errors
    ///
    /// Returns the hydration error, see [`CartStore::hydrate`].
    pub async fn open(
        backend: Arc<dyn PersistenceBackend>,
        options: StoreOptions,
    ) -> Result<Arc<Self>> {
        let store = Arc::new(Self::new(backend, options));
        store.hydrate().await?;
        Ok(store)
    }

    /// Key the cart blob is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.options.key
    }

    /// Load the persisted cart into memory.
    ///
    /// Once a hydration succeeds later calls are no-ops; a call made while
    /// another is in flight waits for it. A failed hydration can be retried.
    /// An absent blob leaves the cart empty. If a mutation was applied before
    /// hydration finished, the in-memory cart wins and the blob is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence` if the backend read fails, and
    /// `CartError::MalformedSnapshot` for unparseable data under
    /// [`HydrationPolicy::Fail`].
    #[instrument(skip(self), fields(key = %self.options.key))]
    pub async fn hydrate(&self) -> Result<()> {
        let _gate = self.hydrate_gate.lock().await;
        if self.hydrated.load(Ordering::Acquire) {
            debug!("Cart already hydrated");
            return Ok(());
        }

        let Some(blob) = self.backend.get(&self.options.key).await? else {
            debug!("No persisted cart, starting empty");
            self.finish_hydration();
            return Ok(());
        };

        let snapshot = match serde_json::from_str::<Snapshot>(&blob) {
            Ok(snapshot) => snapshot,
            Err(source) => match self.options.on_malformed {
                HydrationPolicy::Fail => {
                    self.rejected.store(true, Ordering::Release);
                    return Err(CartError::MalformedSnapshot {
                        key: self.options.key.clone(),
                        source,
                    });
                }
                HydrationPolicy::Discard => {
                    warn!(error = %source, "Discarding malformed persisted cart");
                    self.finish_hydration();
                    return Ok(());
                }
            },
        };

        let entries = snapshot.len();
        let adopted = self.state.send_if_modified(|current| {
            if self.mutated.load(Ordering::Acquire) {
                return false;
            }
            *current = snapshot;
            true
        });

        if adopted {
            info!(entries, "Hydrated cart");
        } else {
            warn!("Cart changed before hydration finished, keeping in-memory cart");
        }
        self.finish_hydration();
        Ok(())
    }

    /// Current cart contents.
    #[must_use]
    pub fn products(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Find the entry for `id` and its position in the current cart.
    #[must_use]
    pub fn lookup(&self, id: &ProductId) -> Option<(usize, CartEntry)> {
        self.state
            .borrow()
            .lookup(id)
            .map(|(position, entry)| (position, entry.clone()))
    }

    /// Receive every new snapshot as it replaces the previous one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Add one unit of `item`, appending it if new, and persist the cart.
    ///
    /// Re-adding a product already in the cart behaves like
    /// [`CartStore::increment`]; the item's title, image and price are ignored.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub async fn add_to_cart(&self, item: CartItem) -> Option<Change> {
        let change = self.apply_add(item);
        if change.is_some() {
            self.write_through().await;
        }
        change
    }

    /// Add one unit to the entry for `id` and persist the cart.
    ///
    /// Unknown ids are a no-op and nothing is written.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn increment(&self, id: &ProductId) -> Option<Change> {
        let change = self.apply_increment(id);
        if change.is_some() {
            self.write_through().await;
        }
        change
    }

    /// Remove one unit from the entry for `id` and persist the cart. The entry
    /// is dropped when its last unit goes.
    ///
    /// Unknown ids are a no-op and nothing is written.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn decrement(&self, id: &ProductId) -> Option<Change> {
        let change = self.apply_decrement(id);
        if change.is_some() {
            self.write_through().await;
        }
        change
    }

    /// Write the current cart to the backend.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Unhydrated` while the persisted blob is malformed
    /// under [`HydrationPolicy::Fail`], and `CartError::Encode` or
    /// `CartError::Persistence` if the write fails.
    pub async fn flush(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        if self.rejected.load(Ordering::Acquire) {
            return Err(CartError::Unhydrated {
                key: self.options.key.clone(),
            });
        }

        let snapshot = self.products();
        let blob = serde_json::to_string(&snapshot).map_err(CartError::Encode)?;
        self.backend.set(&self.options.key, blob).await?;

        debug!(key = %self.options.key, entries = snapshot.len(), "Persisted cart");
        Ok(())
    }

    pub(crate) fn apply_add(&self, item: CartItem) -> Option<Change> {
        self.apply(|cart| cart.add(item))
    }

    pub(crate) fn apply_increment(&self, id: &ProductId) -> Option<Change> {
        self.apply(|cart| cart.increment(id))
    }

    pub(crate) fn apply_decrement(&self, id: &ProductId) -> Option<Change> {
        self.apply(|cart| cart.decrement(id))
    }

    /// Persist the current cart, logging instead of returning failures.
    pub(crate) async fn write_through(&self) {
        if let Err(e) = self.flush().await {
            warn!(error = %e, key = %self.options.key, "Failed to persist cart");
        }
    }

    fn finish_hydration(&self) {
        self.rejected.store(false, Ordering::Release);
        self.hydrated.store(true, Ordering::Release);
    }

    /// Replace the snapshot with the result of `op` in one step.
    fn apply<F>(&self, op: F) -> Option<Change>
    where
        F: FnOnce(&Snapshot) -> Option<(Snapshot, Change)>,
    {
        let mut change = None;
        self.state.send_if_modified(|current| {
            let Some((next, applied)) = op(current) else {
                return false;
            };
            *current = next;
            change = Some(applied);
            self.mutated.store(true, Ordering::Release);
            true
        });

        match change {
            Some(applied) => debug!(?applied, "Cart updated"),
            None => debug!("Product not in cart, nothing to do"),
        }
        change
    }
}

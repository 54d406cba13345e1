//! Pocket Cart Store library.
//!
//! Client-side cart state: an in-memory [`Snapshot`](pocket_cart_core::Snapshot)
//! of cart entries, mirrored to a key-value [`PersistenceBackend`] on every
//! change and made available to UI code through a [`CartProvider`] scope.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pocket_cart_core::{CartItem, Price};
//! use pocket_cart_store::{CartProvider, CartStore, MemoryBackend, StoreOptions, use_cart};
//!
//! # async fn run() -> Result<(), pocket_cart_store::CartError> {
//! let store = CartStore::open(Arc::new(MemoryBackend::new()), StoreOptions::default()).await?;
//! let provider = CartProvider::new(store);
//!
//! provider
//!     .scope(async {
//!         let cart = use_cart()?;
//!         cart.add_to_cart(CartItem::new("A", "Shirt", "u", Price::from_cents(1000)));
//!         cart.flush().await?;
//!         Ok::<_, pocket_cart_store::CartError>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod persistence;
pub mod provider;
pub mod store;

pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use persistence::{FileBackend, MemoryBackend, PersistenceBackend, PersistenceError};
pub use provider::{CartHandle, CartProvider, use_cart};
pub use store::{CartStore, HydrationPolicy, PRODUCTS_KEY, StoreOptions};

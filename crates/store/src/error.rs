//! Unified error handling for the cart store.
//!
//! Only hydration, `flush` and the scoped accessor return errors. Mutations
//! absorb lookup misses as no-ops and log persistence failures instead of
//! returning them, since the in-memory snapshot stays authoritative.

use thiserror::Error;

use crate::persistence::PersistenceError;

/// Error type for cart store operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart accessor was used outside of a `CartProvider` scope.
    #[error("use_cart must be used within a CartProvider scope")]
    OutsideProvider,

    /// The persisted blob could not be parsed as a cart.
    #[error("malformed cart data under key {key}: {source}")]
    MalformedSnapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Hydration rejected the persisted blob, so it must not be overwritten.
    #[error("cart under key {key} failed to hydrate, refusing to overwrite it")]
    Unhydrated { key: String },

    /// The persistence backend failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The snapshot could not be encoded for storage.
    #[error("failed to encode cart snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

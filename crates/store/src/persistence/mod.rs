//! Durable key-value persistence behind the cart.
//!
//! The store only needs "get/set a string blob by key". Anything that can do
//! that (device storage, a file, a map in memory) plugs in by implementing
//! [`PersistenceBackend`].

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Errors reported by a persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the underlying storage failed.
    #[error("storage I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend cannot serve requests right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Async string key-value storage.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Read the value stored under `key`, `None` if nothing was stored.
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError>;
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PersistenceBackend, PersistenceError};

/// In-memory backend.
///
/// Clones share the same map, so a fresh store built on a clone sees what an
/// earlier store wrote (the way a relaunched app sees device storage).
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with one value.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let map = HashMap::from([(key.into(), value.into())]);
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Remove every stored value.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.inner.write().await.insert(key.to_owned(), value);
        Ok(())
    }
}

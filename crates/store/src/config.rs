//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_DIR` - Directory for the file backend (default: .pocket-cart)
//! - `CART_STORAGE_KEY` - Persistence key for the cart blob (default: @cart:products)
//! - `CART_ON_MALFORMED` - What hydration does with unparseable data:
//!   `fail` or `discard` (default: fail)

use std::path::PathBuf;

use thiserror::Error;

use crate::store::{HydrationPolicy, PRODUCTS_KEY, StoreOptions};

const DEFAULT_STORAGE_DIR: &str = ".pocket-cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Invalid {0}: {1}")]
    InvalidValue(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory the file backend writes into
    pub storage_dir: PathBuf,
    /// Key the cart blob is stored under
    pub storage_key: String,
    /// Hydration behavior for malformed persisted data
    pub on_malformed: HydrationPolicy,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_key: PRODUCTS_KEY.to_string(),
            on_malformed: HydrationPolicy::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_dir = lookup("CART_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let storage_key = lookup("CART_STORAGE_KEY").unwrap_or_else(|| PRODUCTS_KEY.to_string());
        check_storage_key(&storage_key)
            .map_err(|reason| ConfigError::InvalidEnvVar("CART_STORAGE_KEY".to_string(), reason))?;

        let on_malformed = match lookup("CART_ON_MALFORMED") {
            Some(value) => value
                .parse::<HydrationPolicy>()
                .map_err(|e| ConfigError::InvalidEnvVar("CART_ON_MALFORMED".to_string(), e))?,
            None => HydrationPolicy::default(),
        };

        Ok(Self {
            storage_dir,
            storage_key,
            on_malformed,
        })
    }

    /// Replace the storage key, e.g. from a command-line override.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the key is blank; the
    /// configuration is left unchanged.
    pub fn set_storage_key(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        let key = key.into();
        check_storage_key(&key)
            .map_err(|reason| ConfigError::InvalidValue("storage key".to_string(), reason))?;
        self.storage_key = key;
        Ok(())
    }

    /// Options for constructing a `CartStore` from this configuration.
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key: self.storage_key.clone(),
            on_malformed: self.on_malformed,
        }
    }
}

fn check_storage_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(())
}

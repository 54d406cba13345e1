//! CLI command implementations.

pub mod cart;

use pocket_cart_core::{PriceError, ProductIdError};
use pocket_cart_store::{CartError, ConfigError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cart store failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Invalid product id argument.
    #[error("Invalid product id: {0}")]
    InvalidId(#[from] ProductIdError),

    /// Invalid price argument.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),
}

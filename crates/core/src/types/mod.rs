//! Core types for Pocket Cart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod quantity;

pub use id::{ProductId, ProductIdError};
pub use price::{Price, PriceError};
pub use quantity::Quantity;

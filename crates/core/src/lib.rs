//! Pocket Cart Core - Shared cart types.
//!
//! This crate provides the domain types used across all Pocket Cart components:
//! - `store` - In-memory cart state with write-through persistence
//! - `cli` - Command-line tool for inspecting and editing a persisted cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no async runtime. Every cart mutation is expressed here as a
//! transition from one immutable [`Snapshot`] to the next, so the rules
//! (uniqueness by id, quantity floor, order preservation) can be tested
//! without a store.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices and quantities
//! - [`cart`] - Cart entries, snapshots and their transitions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::*;
pub use types::*;

//! RocketShoes Core - Shared cart and catalog types.
//!
//! This crate provides the value types shared by the RocketShoes components:
//! - `cart` - Cart store library (catalog client, persistence, operations)
//! - `cli` - Command-line driver for the cart store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. Every type here has value semantics: cart edits produce a new
//! [`Cart`] instead of mutating a shared one.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, catalog records, cart items and carts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

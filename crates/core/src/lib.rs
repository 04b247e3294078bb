//! Marche Core - Shared types library.
//!
//! This crate provides common types used across all Marche components:
//! - `storefront` - Cart/wishlist reconciliation layer and catalog client
//! - `integration-tests` - Async integration tests against a mock store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and the catalog
//!   product record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

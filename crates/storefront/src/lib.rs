//! Marche Storefront - cart/wishlist reconciliation layer.
//!
//! This crate keeps a shopper's two personal collections - the cart and the
//! wishlist - consistent between local UI state and the authoritative remote
//! store, even under rapid and overlapping user actions.
//!
//! # Architecture
//!
//! - The remote store is the source of truth - mutations are followed by a
//!   wholesale snapshot re-fetch, never a local hand-merge
//! - One [`collections::CollectionStore`] per collection kind, scoped to a
//!   resolved identity; identity changes mean teardown and recreate
//! - A per-(collection, product) [`collections::MutationSerializer`] orders
//!   overlapping mutations so concurrent toggles cannot race
//! - Aggregates (totals, counts, membership) and catalog listing transforms
//!   are pure and synchronous
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use marche_storefront::catalog::CatalogClient;
//! use marche_storefront::collections::CartStore;
//! use marche_storefront::config::StorefrontConfig;
//! use marche_storefront::remote::RestStoreClient;
//!
//! let config = StorefrontConfig::from_env()?;
//! let remote = Arc::new(RestStoreClient::new(&config.remote_store)?);
//! let catalog = Arc::new(CatalogClient::new(&config.remote_store)?);
//!
//! let cart = CartStore::new(Some(user_id), remote, catalog);
//! cart.refresh().await?;
//! cart.add(product_id, 1).await?;
//! let total = cart.total().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod collections;
pub mod config;
pub mod error;
pub mod listing;
pub mod remote;

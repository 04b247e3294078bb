//! Catalog provider - read access to the product catalog.
//!
//! The reconciliation layer uses the catalog for two things:
//! - hydrating collection rows whose embedded product snapshot is missing
//! - feeding the listing transforms in [`crate::listing`]
//!
//! Catalog reads are cached ([`moka`], 5-minute TTL by default); carts and
//! wishlists are never cached - they are mutable state.

mod client;

use std::sync::Arc;

use marche_core::{Product, ProductId};

use crate::remote::RemoteError;

pub use client::CatalogClient;

/// Contract consumed from the catalog.
#[allow(async_fn_in_trait)] // consumed via static dispatch only
pub trait CatalogProvider: Send + Sync {
    /// Look up one product. `Ok(None)` when the product does not exist.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError>;

    /// Fetch the active product listing, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, RemoteError>;
}

impl<T: CatalogProvider + ?Sized> CatalogProvider for Arc<T> {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError> {
        (**self).get_product(id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        (**self).list_products().await
    }
}

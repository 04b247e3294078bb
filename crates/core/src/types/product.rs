//! The catalog product record.
//!
//! Products are owned by vendors and served by the catalog provider. The
//! reconciliation layer embeds a denormalized copy of this record in every
//! cart/wishlist row, so it must deserialize from the remote store's
//! relational join as well as from the catalog endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VendorId};
use super::price::Price;

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    /// Pre-discount price, present only when the product is on sale.
    #[serde(default)]
    pub original_price: Option<Price>,
    /// Whole-number discount percentage, strictly positive when on sale.
    #[serde(default)]
    pub discount: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    /// New-arrival flag maintained by the vendor.
    #[serde(default)]
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product carries an active discount.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discount.is_some_and(|d| d > 0)
    }
}

/// Lifecycle status of a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    #[default]
    Active,
    Inactive,
}

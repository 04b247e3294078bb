//! Integration test support for Marche.
//!
//! Provides an in-memory [`MockRemoteStore`] that mimics the remote store's
//! observable contract - per-(user, product) uniqueness, quantity merging on
//! cart upserts, delete-of-missing reported as not-found - plus a
//! [`StaticCatalog`] and product fixtures.
//!
//! The mock also counts remote calls (to assert that blocked actions issue
//! none), can be switched to an unavailable state, and can delay every call
//! to widen race windows in serialization tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use marche_core::{Price, Product, ProductId, ProductStatus, RowId, UserId};
use marche_storefront::catalog::CatalogProvider;
use marche_storefront::collections::CollectionKind;
use marche_storefront::remote::{RemoteError, RemoteRow, RemoteStore};

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// A product fixture with a deterministic creation time.
#[must_use]
pub fn product(id: &str, title: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: None,
        price: Price::fcfa(price),
        original_price: None,
        discount: None,
        image_url: None,
        stock_quantity: 10,
        status: ProductStatus::Active,
        vendor_id: None,
        is_new: false,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).single().expect("valid date"),
    }
}

/// The test shopper.
#[must_use]
pub fn shopper() -> UserId {
    UserId::new("shopper-1")
}

#[derive(Debug, Clone)]
struct StoredRow {
    id: RowId,
    owner: UserId,
    product_id: ProductId,
    quantity: u32,
}

/// In-memory stand-in for the remote store.
#[derive(Default)]
pub struct MockRemoteStore {
    rows: Mutex<HashMap<CollectionKind, Vec<StoredRow>>>,
    /// Products known to the remote relation join. A row whose product is
    /// missing here lists with `product: None`, like a deleted catalog row.
    products: Mutex<HashMap<ProductId, Product>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    delay: Mutex<Duration>,
}

impl MockRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the joined product available for listing responses.
    pub fn insert_product(&self, product: Product) {
        self.products
            .lock()
            .expect("mock state poisoned")
            .insert(product.id.clone(), product);
    }

    /// Preload a row behind the store's back (a concurrent session's write).
    pub fn insert_row(&self, kind: CollectionKind, owner: &UserId, product_id: &ProductId, quantity: u32) -> RowId {
        let id = RowId::new(Uuid::new_v4().to_string());
        self.rows
            .lock()
            .expect("mock state poisoned")
            .entry(kind)
            .or_default()
            .push(StoredRow {
                id: id.clone(),
                owner: owner.clone(),
                product_id: product_id.clone(),
                quantity,
            });
        id
    }

    /// Number of remote calls seen so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Toggle hard failure of every subsequent call.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call, widening race windows.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("mock state poisoned") = delay;
    }

    /// The (product, quantity) pairs currently stored for the owner.
    #[must_use]
    pub fn stored(&self, kind: CollectionKind, owner: &UserId) -> Vec<(ProductId, u32)> {
        self.rows
            .lock()
            .expect("mock state poisoned")
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|row| &row.owner == owner)
                    .map(|row| (row.product_id.clone(), row.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn begin(&self) -> Result<(), RemoteError> {
        let delay = *self.delay.lock().expect("mock state poisoned");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 503,
                message: "mock remote store is unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteStore for MockRemoteStore {
    async fn list_rows(
        &self,
        kind: CollectionKind,
        owner: &UserId,
    ) -> Result<Vec<RemoteRow>, RemoteError> {
        self.begin().await?;
        let products = self.products.lock().expect("mock state poisoned");
        let rows = self.rows.lock().expect("mock state poisoned");
        Ok(rows
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|row| &row.owner == owner)
                    .map(|row| RemoteRow {
                        id: row.id.clone(),
                        product_id: row.product_id.clone(),
                        quantity: match kind {
                            CollectionKind::Cart => Some(row.quantity),
                            CollectionKind::Wishlist => None,
                        },
                        product: products.get(&row.product_id).cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_row(
        &self,
        kind: CollectionKind,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Option<u32>,
    ) -> Result<RowId, RemoteError> {
        self.begin().await?;
        let mut rows = self.rows.lock().expect("mock state poisoned");
        let rows = rows.entry(kind).or_default();

        if let Some(existing) = rows
            .iter_mut()
            .find(|row| &row.owner == owner && &row.product_id == product_id)
        {
            return match kind {
                // The remote store merges cart quantities on conflict.
                CollectionKind::Cart => {
                    existing.quantity += quantity.unwrap_or(1);
                    Ok(existing.id.clone())
                }
                // Wishlist inserts hit the uniqueness constraint.
                CollectionKind::Wishlist => Err(RemoteError::DuplicateMembership),
            };
        }

        let id = RowId::new(Uuid::new_v4().to_string());
        rows.push(StoredRow {
            id: id.clone(),
            owner: owner.clone(),
            product_id: product_id.clone(),
            quantity: quantity.unwrap_or(1),
        });
        Ok(id)
    }

    async fn update_row(
        &self,
        kind: CollectionKind,
        row_id: &RowId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        self.begin().await?;
        let mut rows = self.rows.lock().expect("mock state poisoned");
        let row = rows
            .entry(kind)
            .or_default()
            .iter_mut()
            .find(|row| &row.id == row_id);
        match row {
            Some(row) => {
                row.quantity = quantity;
                Ok(())
            }
            None => Err(RemoteError::NotFound(row_id.clone())),
        }
    }

    async fn delete_row(&self, kind: CollectionKind, row_id: &RowId) -> Result<(), RemoteError> {
        self.begin().await?;
        let mut rows = self.rows.lock().expect("mock state poisoned");
        let rows = rows.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|row| &row.id != row_id);
        if rows.len() == before {
            return Err(RemoteError::NotFound(row_id.clone()));
        }
        Ok(())
    }

    async fn clear_rows(&self, kind: CollectionKind, owner: &UserId) -> Result<(), RemoteError> {
        self.begin().await?;
        let mut rows = self.rows.lock().expect("mock state poisoned");
        rows.entry(kind).or_default().retain(|row| &row.owner != owner);
        Ok(())
    }
}

/// Fixed in-memory catalog.
#[derive(Default)]
pub struct StaticCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products
            .lock()
            .expect("catalog state poisoned")
            .insert(product.id.clone(), product);
    }
}

impl CatalogProvider for StaticCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError> {
        Ok(self
            .products
            .lock()
            .expect("catalog state poisoned")
            .get(id)
            .cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        let mut products: Vec<Product> = self
            .products
            .lock()
            .expect("catalog state poisoned")
            .values()
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }
}

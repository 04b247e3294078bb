//! Catalog REST client with response caching.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::Method;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use marche_core::{Product, ProductId};

use crate::config::RemoteStoreConfig;
use crate::remote::{RemoteError, WireProduct, convert_product};

use super::CatalogProvider;

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Listing,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Listing(Vec<Product>),
}

/// Client for the product catalog.
///
/// Cheaply cloneable; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.url.clone(),
                api_key: config.api_key.expose_secret().to_string(),
                cache,
            }),
        })
    }

    async fn fetch_products(&self, query: &[(&str, &str)]) -> Result<Vec<Product>, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.set_path("/rest/v1/products");

        let response = self
            .inner
            .client
            .request(Method::GET, url)
            .header("apikey", &self.inner.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.inner.api_key),
            )
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let products: Vec<WireProduct> = response.json().await?;
        Ok(products.into_iter().map(convert_product).collect())
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

impl CatalogProvider for CatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let id_filter = format!("eq.{id}");
        let products = self
            .fetch_products(&[("select", "*"), ("id", &id_filter), ("limit", "1")])
            .await?;

        let Some(product) = products.into_iter().next() else {
            return Ok(None);
        };

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(Some(product))
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        if let Some(CacheValue::Listing(products)) = self.inner.cache.get(&CacheKey::Listing).await
        {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = self
            .fetch_products(&[
                ("select", "*"),
                ("status", "eq.active"),
                ("order", "created_at.desc"),
            ])
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Listing, CacheValue::Listing(products.clone()))
            .await;

        Ok(products)
    }
}

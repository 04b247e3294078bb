//! PostgREST-style remote store client implementation.
//!
//! Talks to the store's REST API with `reqwest`. Rows are read with their
//! product joined in (`products(*)`), cart upserts merge quantities
//! server-side (`resolution=merge-duplicates`), wishlist inserts surface the
//! uniqueness violation (Postgres `23505`) as
//! [`RemoteError::DuplicateMembership`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use marche_core::{CurrencyCode, Price, Product, ProductId, ProductStatus, RowId, UserId, VendorId};

use crate::collections::CollectionKind;
use crate::config::RemoteStoreConfig;

use super::{RemoteError, RemoteRow, RemoteStore};

/// Postgres error code for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Client for the remote store REST API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct RestStoreClient {
    inner: Arc<RestStoreClientInner>,
}

struct RestStoreClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl RestStoreClient {
    /// Create a new remote store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestStoreClientInner {
                client,
                base_url: config.url.clone(),
                api_key: config.api_key.expose_secret().to_string(),
            }),
        })
    }

    /// Build a request against `/rest/v1/{table}` with auth headers applied.
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let mut url = self.inner.base_url.clone();
        url.set_path(&format!("/rest/v1/{table}"));

        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.inner.api_key),
            )
            .header("Content-Type", HeaderValue::from_static("application/json"))
    }
}

impl RemoteStore for RestStoreClient {
    #[instrument(skip(self), fields(kind = %kind, owner = %owner))]
    async fn list_rows(
        &self,
        kind: CollectionKind,
        owner: &UserId,
    ) -> Result<Vec<RemoteRow>, RemoteError> {
        let select = match kind {
            CollectionKind::Cart => "id,product_id,quantity,products(*)",
            CollectionKind::Wishlist => "id,product_id,products(*)",
        };

        let owner_filter = format!("eq.{owner}");
        let response = self
            .request(Method::GET, kind.table())
            .query(&[("select", select), ("user_id", owner_filter.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let rows: Vec<WireRow> = response.json().await?;
        Ok(rows.into_iter().map(convert_row).collect())
    }

    #[instrument(skip(self), fields(kind = %kind, product_id = %product_id))]
    async fn upsert_row(
        &self,
        kind: CollectionKind,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Option<u32>,
    ) -> Result<RowId, RemoteError> {
        let mut body = serde_json::json!({
            "user_id": owner,
            "product_id": product_id,
        });
        if let (Some(quantity), Some(map)) = (quantity, body.as_object_mut()) {
            map.insert("quantity".to_string(), quantity.into());
        }

        // Cart rows merge quantities on conflict; wishlist inserts let the
        // uniqueness constraint fire so the duplicate can be reported.
        let request = match kind {
            CollectionKind::Cart => self
                .request(Method::POST, kind.table())
                .query(&[("on_conflict", "user_id,product_id")])
                .header(
                    "Prefer",
                    HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
                ),
            CollectionKind::Wishlist => self
                .request(Method::POST, kind.table())
                .header("Prefer", HeaderValue::from_static("return=representation")),
        };

        let response = request.json(&body).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let inserted: Vec<InsertedRow> = response.json().await?;
        inserted
            .into_iter()
            .next()
            .map(|row| row.id)
            .ok_or(RemoteError::MissingData)
    }

    #[instrument(skip(self), fields(kind = %kind, row_id = %row_id))]
    async fn update_row(
        &self,
        kind: CollectionKind,
        row_id: &RowId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        let response = self
            .request(Method::PATCH, kind.table())
            .query(&[("id", &format!("eq.{row_id}"))])
            .header("Prefer", HeaderValue::from_static("return=representation"))
            .json(&serde_json::json!({ "quantity": quantity }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        // An empty representation means the filter matched nothing.
        let updated: Vec<InsertedRow> = response.json().await?;
        if updated.is_empty() {
            return Err(RemoteError::NotFound(row_id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(kind = %kind, row_id = %row_id))]
    async fn delete_row(&self, kind: CollectionKind, row_id: &RowId) -> Result<(), RemoteError> {
        let response = self
            .request(Method::DELETE, kind.table())
            .query(&[("id", &format!("eq.{row_id}"))])
            .header("Prefer", HeaderValue::from_static("return=representation"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let deleted: Vec<InsertedRow> = response.json().await?;
        if deleted.is_empty() {
            return Err(RemoteError::NotFound(row_id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(kind = %kind, owner = %owner))]
    async fn clear_rows(&self, kind: CollectionKind, owner: &UserId) -> Result<(), RemoteError> {
        let response = self
            .request(Method::DELETE, kind.table())
            .query(&[("user_id", &format!("eq.{owner}"))])
            .header("Prefer", HeaderValue::from_static("return=minimal"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

/// Translate a non-success response into a [`RemoteError`].
async fn error_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(api_error) = serde_json::from_str::<PostgrestError>(&body) {
        if api_error.code == UNIQUE_VIOLATION || status == StatusCode::CONFLICT {
            return RemoteError::DuplicateMembership;
        }
        tracing::error!(
            status = %status,
            code = %api_error.code,
            message = %api_error.message,
            "Remote store returned an error"
        );
        return RemoteError::Api {
            status: status.as_u16(),
            message: api_error.message,
        };
    }

    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Remote store returned non-success status"
    );
    RemoteError::Api {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Structured error body returned by the API.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Insert/update/delete representation - only the row ID is needed.
#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: RowId,
}

/// A collection row as it appears on the wire, product joined in as
/// `products`.
#[derive(Debug, Deserialize)]
struct WireRow {
    id: RowId,
    product_id: ProductId,
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    products: Option<WireProduct>,
}

/// A catalog product row as stored remotely (flat numeric prices, FCFA).
#[derive(Debug, Deserialize)]
pub(crate) struct WireProduct {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
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
    #[serde(default)]
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Type Conversions
// =============================================================================

fn convert_row(row: WireRow) -> RemoteRow {
    RemoteRow {
        id: row.id,
        product_id: row.product_id,
        quantity: row.quantity,
        product: row.products.map(convert_product),
    }
}

/// Convert a wire product into the shared domain record. Prices are FCFA.
pub(crate) fn convert_product(product: WireProduct) -> Product {
    Product {
        id: product.id,
        title: product.title,
        description: product.description,
        price: Price::new(product.price, CurrencyCode::XOF),
        original_price: product
            .original_price
            .map(|amount| Price::new(amount, CurrencyCode::XOF)),
        discount: product.discount,
        image_url: product.image_url,
        stock_quantity: product.stock_quantity,
        status: product.status,
        vendor_id: product.vendor_id,
        is_new: product.is_new,
        created_at: product.created_at,
    }
}

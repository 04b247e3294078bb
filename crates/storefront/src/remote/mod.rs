//! Remote store client for the cart and wishlist relations.
//!
//! # Architecture
//!
//! - The remote store is the source of truth - every mutation is followed by
//!   a wholesale re-fetch, never a local merge
//! - The store enforces a uniqueness constraint on (user, product) per
//!   relation; a violation is an expected outcome of concurrent intent and is
//!   reported as [`RemoteError::DuplicateMembership`], not a transport failure
//! - Row ownership is enforced remotely - the client never assumes local
//!   authorization
//!
//! The concrete implementation, [`RestStoreClient`], speaks a PostgREST-style
//! HTTP API with `reqwest`. Everything above it depends only on the
//! [`RemoteStore`] trait so tests can substitute an in-memory store.

mod rest;

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use marche_core::{Product, ProductId, RowId, UserId};

use crate::collections::CollectionKind;

pub use rest::RestStoreClient;
pub(crate) use rest::{WireProduct, convert_product};

/// Errors returned by the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Uniqueness violation on (user, product). Expected under concurrent
    /// intent; callers treat it as an informational outcome.
    #[error("row already exists for this (user, product) pair")]
    DuplicateMembership,

    /// The targeted row no longer exists.
    #[error("row not found: {0}")]
    NotFound(RowId),

    /// The API answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered success but with no usable payload.
    #[error("response contained no data")]
    MissingData,
}

/// One persisted membership record as returned by the remote store.
///
/// The `product` snapshot comes from the relational join and may be absent
/// when the referenced product was deleted; such rows are orphaned and get
/// dropped during hydration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRow {
    pub id: RowId,
    pub product_id: ProductId,
    /// Cart rows carry a quantity; wishlist rows do not.
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Contract consumed from the remote store.
///
/// All methods are remote calls; timeouts are the implementation's concern
/// and surface as [`RemoteError::Http`].
#[allow(async_fn_in_trait)] // consumed via static dispatch only
pub trait RemoteStore: Send + Sync {
    /// Fetch every row the owner has in the given collection.
    async fn list_rows(
        &self,
        kind: CollectionKind,
        owner: &UserId,
    ) -> Result<Vec<RemoteRow>, RemoteError>;

    /// Insert a row keyed on (owner, product).
    ///
    /// For the cart the store merges quantities on conflict; for the
    /// wishlist a conflict is reported as
    /// [`RemoteError::DuplicateMembership`].
    async fn upsert_row(
        &self,
        kind: CollectionKind,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Option<u32>,
    ) -> Result<RowId, RemoteError>;

    /// Set the quantity of an existing row.
    async fn update_row(
        &self,
        kind: CollectionKind,
        row_id: &RowId,
        quantity: u32,
    ) -> Result<(), RemoteError>;

    /// Delete a single row by ID.
    async fn delete_row(&self, kind: CollectionKind, row_id: &RowId) -> Result<(), RemoteError>;

    /// Delete every row the owner has in the collection in one operation.
    async fn clear_rows(&self, kind: CollectionKind, owner: &UserId) -> Result<(), RemoteError>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn list_rows(
        &self,
        kind: CollectionKind,
        owner: &UserId,
    ) -> Result<Vec<RemoteRow>, RemoteError> {
        (**self).list_rows(kind, owner).await
    }

    async fn upsert_row(
        &self,
        kind: CollectionKind,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Option<u32>,
    ) -> Result<RowId, RemoteError> {
        (**self).upsert_row(kind, owner, product_id, quantity).await
    }

    async fn update_row(
        &self,
        kind: CollectionKind,
        row_id: &RowId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        (**self).update_row(kind, row_id, quantity).await
    }

    async fn delete_row(&self, kind: CollectionKind, row_id: &RowId) -> Result<(), RemoteError> {
        (**self).delete_row(kind, row_id).await
    }

    async fn clear_rows(&self, kind: CollectionKind, owner: &UserId) -> Result<(), RemoteError> {
        (**self).clear_rows(kind, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::NotFound(RowId::new("row-9"));
        assert_eq!(err.to_string(), "row not found: row-9");

        let err = RemoteError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 503): service unavailable"
        );
    }

    #[test]
    fn test_remote_row_deserialize_without_product() {
        let json = r#"{"id": "r1", "product_id": "p1", "quantity": 2}"#;
        let row: RemoteRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.quantity, Some(2));
        assert!(row.product.is_none());
    }
}

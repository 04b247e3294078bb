//! Collection stores - the reconciliation layer proper.
//!
//! One [`CollectionStore`] instance owns the snapshot for one collection
//! kind, scoped to a resolved identity. When the signed-in user changes, the
//! owning application tears the stores down and creates fresh ones; a store
//! never switches identity in place.
//!
//! The typed facades [`CartStore`] and [`WishlistStore`] expose only the
//! operations valid for their kind, so quantity updates on a wishlist or
//! toggles on a cart are unrepresentable.

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use marche_core::{Price, ProductId, RowId, UserId};

use crate::catalog::CatalogProvider;
use crate::error::{Result, StoreError};
use crate::remote::{RemoteError, RemoteStore};

use super::{
    CollectionKind, CollectionRow, CollectionSnapshot, MutationKey, MutationOutcome,
    MutationSerializer, ToggleOutcome, aggregate,
};

/// Owns one collection snapshot and mediates all reads and writes for it.
pub struct CollectionStore<R, C> {
    kind: CollectionKind,
    identity: Option<UserId>,
    remote: R,
    catalog: C,
    serializer: MutationSerializer,
    snapshot: RwLock<CollectionSnapshot>,
}

impl<R: RemoteStore, C: CatalogProvider> CollectionStore<R, C> {
    /// Create a store scoped to `identity`. An anonymous store (no identity)
    /// keeps an empty snapshot and refuses every mutation with
    /// [`StoreError::AuthenticationRequired`].
    pub fn new(kind: CollectionKind, identity: Option<UserId>, remote: R, catalog: C) -> Self {
        Self {
            kind,
            identity,
            remote,
            catalog,
            serializer: MutationSerializer::new(),
            snapshot: RwLock::new(CollectionSnapshot::default()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    /// Clone of the current snapshot.
    ///
    /// Safe to hold arbitrarily long - it is a point-in-time view, detached
    /// from subsequent refreshes.
    pub async fn snapshot(&self) -> CollectionSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Re-fetch all rows from the remote store and replace the snapshot
    /// wholesale.
    ///
    /// Rows whose product reference cannot be resolved (deleted product,
    /// failed hydration) are dropped. On failure the existing snapshot is
    /// left untouched so the UI never flashes empty.
    ///
    /// # Errors
    ///
    /// [`StoreError::RemoteUnavailable`] when the listing call fails.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn refresh(&self) -> Result<()> {
        let Some(owner) = &self.identity else {
            // Collections are meaningless without identity; the snapshot is
            // already empty and stays that way.
            return Ok(());
        };

        let remote_rows = self.remote.list_rows(self.kind, owner).await?;
        let fetched = remote_rows.len();

        let mut rows = Vec::with_capacity(fetched);
        for remote_row in remote_rows {
            let product = match remote_row.product {
                Some(product) => Some(product),
                None => self.hydrate(&remote_row.product_id).await,
            };
            match product {
                Some(product) => rows.push(CollectionRow {
                    id: remote_row.id,
                    product_id: remote_row.product_id,
                    quantity: remote_row.quantity.unwrap_or(1).max(1),
                    product,
                }),
                None => {
                    warn!(
                        row_id = %remote_row.id,
                        product_id = %remote_row.product_id,
                        "Dropping orphaned row without resolvable product"
                    );
                }
            }
        }

        debug!(rows = rows.len(), fetched, "Replacing snapshot");
        *self.snapshot.write().await = CollectionSnapshot::new(rows);
        Ok(())
    }

    /// Resolve a product through the catalog when the embedded snapshot is
    /// missing. Any failure counts as unresolvable.
    async fn hydrate(&self, product_id: &ProductId) -> Option<marche_core::Product> {
        match self.catalog.get_product(product_id).await {
            Ok(product) => product,
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Product hydration failed");
                None
            }
        }
    }

    fn owner(&self) -> Result<&UserId> {
        self.identity
            .as_ref()
            .ok_or(StoreError::AuthenticationRequired)
    }

    fn key_for(&self, product_id: &ProductId) -> MutationKey {
        MutationKey::new(self.kind, product_id.clone())
    }

    /// Add a membership row for `product_id`, serialized on its key.
    ///
    /// `quantity` is `Some` for the cart and `None` for the wishlist.
    async fn add_serialized(
        &self,
        product_id: &ProductId,
        quantity: Option<u32>,
    ) -> Result<MutationOutcome> {
        let owner = self.owner()?;
        let _guard = self.serializer.acquire(self.key_for(product_id)).await;
        self.add_locked(owner, product_id, quantity).await
    }

    /// Add under an already-held key guard.
    async fn add_locked(
        &self,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Option<u32>,
    ) -> Result<MutationOutcome> {
        match self
            .remote
            .upsert_row(self.kind, owner, product_id, quantity)
            .await
        {
            Ok(_) => {
                self.refresh().await?;
                Ok(MutationOutcome::Applied)
            }
            // Informational: the row already exists. The snapshot is left
            // as-is until the next refresh confirms state.
            Err(RemoteError::DuplicateMembership) => Ok(MutationOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the row `row_id`, serialized on its product key when the row
    /// is known locally. A row absent from the snapshot is deleted without a
    /// key guard - the remote tolerates delete-of-missing as a no-op.
    async fn remove_serialized(&self, row_id: &RowId) -> Result<MutationOutcome> {
        self.owner()?;

        let product_id = {
            let snapshot = self.snapshot.read().await;
            snapshot
                .iter()
                .find(|row| &row.id == row_id)
                .map(|row| row.product_id.clone())
        };

        let _guard = match product_id {
            Some(product_id) => Some(self.serializer.acquire(self.key_for(&product_id)).await),
            None => None,
        };
        self.remove_locked(row_id).await
    }

    /// Delete under an already-held key guard (or none for unknown rows).
    async fn remove_locked(&self, row_id: &RowId) -> Result<MutationOutcome> {
        match self.remote.delete_row(self.kind, row_id).await {
            Ok(()) => {
                self.refresh().await?;
                Ok(MutationOutcome::Applied)
            }
            // The row vanished under us - the intent is already satisfied,
            // but the snapshot is stale, so re-sync before reporting.
            Err(RemoteError::NotFound(_)) => {
                self.refresh().await?;
                Ok(MutationOutcome::AlreadyGone)
            }
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// The shopper's cart: rows carry quantities, aggregates carry a total.
pub struct CartStore<R, C> {
    store: CollectionStore<R, C>,
}

impl<R: RemoteStore, C: CatalogProvider> CartStore<R, C> {
    #[must_use]
    pub fn new(identity: Option<UserId>, remote: R, catalog: C) -> Self {
        Self {
            store: CollectionStore::new(CollectionKind::Cart, identity, remote, catalog),
        }
    }

    /// Re-synchronize the snapshot from the remote store.
    ///
    /// # Errors
    ///
    /// [`StoreError::RemoteUnavailable`] when the remote call fails; the
    /// snapshot is left untouched.
    pub async fn refresh(&self) -> Result<()> {
        self.store.refresh().await
    }

    /// Add `quantity` of a product (minimum 1). On conflict the remote store
    /// merges quantities, so a duplicate is still a success.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthenticationRequired`] for anonymous shoppers (no
    /// remote call is attempted); [`StoreError::RemoteUnavailable`] on
    /// transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<MutationOutcome> {
        self.store
            .add_serialized(product_id, Some(quantity.max(1)))
            .await
    }

    /// Remove one cart line by row ID.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`]; a line already gone is an informational
    /// [`MutationOutcome::AlreadyGone`], not an error.
    #[instrument(skip(self), fields(row_id = %row_id))]
    pub async fn remove(&self, row_id: &RowId) -> Result<MutationOutcome> {
        self.store.remove_serialized(row_id).await
    }

    /// Set the quantity of a cart line. Zero delegates to [`Self::remove`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`].
    #[instrument(skip(self), fields(row_id = %row_id, quantity))]
    pub async fn set_quantity(&self, row_id: &RowId, quantity: u32) -> Result<MutationOutcome> {
        if quantity == 0 {
            return self.remove(row_id).await;
        }

        self.store.owner()?;

        let product_id = {
            let snapshot = self.store.snapshot.read().await;
            snapshot
                .iter()
                .find(|row| &row.id == row_id)
                .map(|row| row.product_id.clone())
        };
        let _guard = match product_id {
            Some(product_id) => Some(
                self.store
                    .serializer
                    .acquire(self.store.key_for(&product_id))
                    .await,
            ),
            None => None,
        };

        match self
            .store
            .remote
            .update_row(CollectionKind::Cart, row_id, quantity)
            .await
        {
            Ok(()) => {
                self.store.refresh().await?;
                Ok(MutationOutcome::Applied)
            }
            Err(RemoteError::NotFound(_)) => {
                self.store.refresh().await?;
                Ok(MutationOutcome::AlreadyGone)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every cart line in one operation and empty the local snapshot
    /// immediately - the intent is unconditional, so no re-fetch is needed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`].
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let owner = self.store.owner()?;
        self.store
            .remote
            .clear_rows(CollectionKind::Cart, owner)
            .await?;
        *self.store.snapshot.write().await = CollectionSnapshot::default();
        Ok(())
    }

    /// Point-in-time clone of the snapshot.
    pub async fn snapshot(&self) -> CollectionSnapshot {
        self.store.snapshot().await
    }

    /// Cart total over the current snapshot.
    pub async fn total(&self) -> Price {
        aggregate::cart_total(&*self.store.snapshot.read().await)
    }

    /// Total number of items (sum of quantities).
    pub async fn item_count(&self) -> u64 {
        aggregate::cart_item_count(&*self.store.snapshot.read().await)
    }

    /// Whether the product is in the cart.
    pub async fn contains(&self, product_id: &ProductId) -> bool {
        aggregate::contains(&*self.store.snapshot.read().await, product_id)
    }
}

// =============================================================================
// WishlistStore
// =============================================================================

/// The shopper's wishlist: membership only, no quantities.
pub struct WishlistStore<R, C> {
    store: CollectionStore<R, C>,
}

impl<R: RemoteStore, C: CatalogProvider> WishlistStore<R, C> {
    #[must_use]
    pub fn new(identity: Option<UserId>, remote: R, catalog: C) -> Self {
        Self {
            store: CollectionStore::new(CollectionKind::Wishlist, identity, remote, catalog),
        }
    }

    /// Re-synchronize the snapshot from the remote store.
    ///
    /// # Errors
    ///
    /// [`StoreError::RemoteUnavailable`] when the remote call fails; the
    /// snapshot is left untouched.
    pub async fn refresh(&self) -> Result<()> {
        self.store.refresh().await
    }

    /// Add a product to the wishlist. Adding a product that is already there
    /// reports [`MutationOutcome::Duplicate`] - a distinct, non-error signal.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthenticationRequired`] for anonymous shoppers (no
    /// remote call is attempted); [`StoreError::RemoteUnavailable`] on
    /// transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<MutationOutcome> {
        self.store.add_serialized(product_id, None).await
    }

    /// Remove one wishlist row by row ID.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`].
    #[instrument(skip(self), fields(row_id = %row_id))]
    pub async fn remove(&self, row_id: &RowId) -> Result<MutationOutcome> {
        self.store.remove_serialized(row_id).await
    }

    /// Flip the product's membership: present becomes absent and vice versa.
    ///
    /// The direction is decided from the snapshot as seen at submission
    /// time, then the mutation executes under the key guard. Two toggles in
    /// immediate succession therefore carry the same intent - the second
    /// one's redundant insert or delete surfaces as
    /// [`ToggleOutcome::AlreadyPresent`] or a tolerated delete-of-missing,
    /// and the product ends up present exactly once, never doubled and
    /// never lost.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle(&self, product_id: &ProductId) -> Result<ToggleOutcome> {
        let owner = self.store.owner()?.clone();
        let existing = {
            let snapshot = self.store.snapshot.read().await;
            aggregate::row_for_product(&snapshot, product_id).map(|row| row.id.clone())
        };

        let _guard = self
            .store
            .serializer
            .acquire(self.store.key_for(product_id))
            .await;

        match existing {
            Some(row_id) => {
                // AlreadyGone still means the product is absent now.
                self.store.remove_locked(&row_id).await?;
                Ok(ToggleOutcome::Removed)
            }
            None => match self.store.add_locked(&owner, product_id, None).await? {
                MutationOutcome::Duplicate => {
                    // Another session won the insert race; wasted work only.
                    self.store.refresh().await?;
                    Ok(ToggleOutcome::AlreadyPresent)
                }
                _ => Ok(ToggleOutcome::Added),
            },
        }
    }

    /// Point-in-time clone of the snapshot.
    pub async fn snapshot(&self) -> CollectionSnapshot {
        self.store.snapshot().await
    }

    /// Number of wishlist rows.
    pub async fn count(&self) -> usize {
        aggregate::wishlist_count(&*self.store.snapshot.read().await)
    }

    /// Whether the product is in the wishlist.
    pub async fn contains(&self, product_id: &ProductId) -> bool {
        aggregate::contains(&*self.store.snapshot.read().await, product_id)
    }

    /// The wishlist row for a product, if present.
    pub async fn row_for_product(&self, product_id: &ProductId) -> Option<RowId> {
        aggregate::row_for_product(&*self.store.snapshot.read().await, product_id)
            .map(|row| row.id.clone())
    }
}

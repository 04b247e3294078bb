//! Cart/wishlist collection state.
//!
//! A collection is either the cart or the wishlist - structurally identical
//! from this layer's point of view: a set of remotely persisted rows, one per
//! (user, product) pair, mirrored locally as a [`CollectionSnapshot`].
//!
//! # Consistency model
//!
//! Mutations go remote-first; on success the whole snapshot is re-fetched and
//! replaced, never patched from partial mutation responses. Overlapping
//! mutations on the same (collection, product) key are ordered by the
//! [`MutationSerializer`]; distinct keys proceed in parallel.

mod aggregate;
mod serializer;
mod store;

use serde::{Deserialize, Serialize};

use marche_core::{Product, ProductId, RowId};

pub use aggregate::{cart_item_count, cart_total, contains, row_for_product, wishlist_count};
pub use serializer::{MutationKey, MutationSerializer};
pub use store::{CartStore, CollectionStore, WishlistStore};

/// Which personal collection a store instance reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Cart,
    Wishlist,
}

impl CollectionKind {
    /// Remote relation backing this collection.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Cart => "cart_items",
            Self::Wishlist => "wishlist_items",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        })
    }
}

/// One validated line of a cart or wishlist.
///
/// Unlike the raw [`crate::remote::RemoteRow`], the product reference here is
/// required - rows whose product could not be resolved never make it into a
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRow {
    /// Remote-assigned row identifier.
    pub id: RowId,
    pub product_id: ProductId,
    /// Always >= 1; wishlist rows are fixed at 1.
    pub quantity: u32,
    /// Denormalized product snapshot, validated at refresh time.
    pub product: Product,
}

/// The complete, currently-known set of rows for one collection instance.
///
/// Owned exclusively by its collection store and replaced wholesale on every
/// successful re-fetch; consumers only ever see read-only views or clones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSnapshot {
    rows: Vec<CollectionRow>,
}

impl CollectionSnapshot {
    pub(crate) fn new(rows: Vec<CollectionRow>) -> Self {
        Self { rows }
    }

    /// Read-only view of the rows, in remote listing order.
    #[must_use]
    pub fn rows(&self) -> &[CollectionRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CollectionRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a CollectionSnapshot {
    type Item = &'a CollectionRow;
    type IntoIter = std::slice::Iter<'a, CollectionRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Terminal outcome of a single mutating action.
///
/// Every user-initiated mutation yields exactly one of these (or one
/// [`crate::error::StoreError`]) - never zero, never more than one, however
/// many queued remote calls it triggered internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation took effect and the snapshot was re-synchronized.
    Applied,
    /// The row already existed. Informational, not an error; the snapshot is
    /// left unchanged until the next refresh confirms state.
    Duplicate,
    /// The target row had already vanished remotely. The intent is
    /// satisfied; the snapshot was re-synchronized.
    AlreadyGone,
}

/// Terminal outcome of a wishlist toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The product was absent and has been added.
    Added,
    /// A concurrent writer added the product first; it is present.
    AlreadyPresent,
    /// The product was present and has been removed.
    Removed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_kind_tables() {
        assert_eq!(CollectionKind::Cart.table(), "cart_items");
        assert_eq!(CollectionKind::Wishlist.table(), "wishlist_items");
    }

    #[test]
    fn test_collection_kind_display() {
        assert_eq!(CollectionKind::Cart.to_string(), "cart");
        assert_eq!(CollectionKind::Wishlist.to_string(), "wishlist");
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CollectionSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.iter().count(), 0);
    }
}

//! Derived aggregates over a collection snapshot.
//!
//! Pure, synchronous, no I/O. Everything here is a linear scan: snapshots
//! hold tens of rows and are replaced wholesale on every re-sync, so an
//! index would need rebuilding exactly as often as a scan costs.

use rust_decimal::Decimal;

use marche_core::{CurrencyCode, Price, ProductId};

use super::{CollectionRow, CollectionSnapshot};

/// Cart total: sum of `quantity * price` over all rows.
///
/// Rows are validated at refresh time, so every product is resolvable; the
/// sum over an empty snapshot is a zero FCFA price.
#[must_use]
pub fn cart_total(snapshot: &CollectionSnapshot) -> Price {
    let amount: Decimal = snapshot
        .iter()
        .map(|row| Decimal::from(row.quantity) * row.product.price.amount)
        .sum();
    Price::new(amount, CurrencyCode::XOF)
}

/// Total number of items in the cart (sum of quantities).
#[must_use]
pub fn cart_item_count(snapshot: &CollectionSnapshot) -> u64 {
    snapshot.iter().map(|row| u64::from(row.quantity)).sum()
}

/// Number of wishlist rows (quantities don't apply).
#[must_use]
pub fn wishlist_count(snapshot: &CollectionSnapshot) -> usize {
    snapshot.len()
}

/// Whether the snapshot holds a row for `product_id`.
#[must_use]
pub fn contains(snapshot: &CollectionSnapshot, product_id: &ProductId) -> bool {
    row_for_product(snapshot, product_id).is_some()
}

/// The row for `product_id`, if any. There is at most one - the remote
/// store enforces uniqueness per (user, product).
#[must_use]
pub fn row_for_product<'a>(
    snapshot: &'a CollectionSnapshot,
    product_id: &ProductId,
) -> Option<&'a CollectionRow> {
    snapshot.iter().find(|row| &row.product_id == product_id)
}

//! Wishlist store behavior against the in-memory remote store.

use std::sync::Arc;

use marche_core::{ProductId, UserId};
use marche_integration_tests::{MockRemoteStore, StaticCatalog, product, shopper};
use marche_storefront::collections::{CollectionKind, MutationOutcome, ToggleOutcome, WishlistStore};
use marche_storefront::error::StoreError;

type TestWishlist = WishlistStore<Arc<MockRemoteStore>, Arc<StaticCatalog>>;

fn wishlist_fixture(
    identity: Option<UserId>,
) -> (Arc<MockRemoteStore>, Arc<StaticCatalog>, TestWishlist) {
    let remote = Arc::new(MockRemoteStore::new());
    let catalog = Arc::new(StaticCatalog::new());
    let wishlist = WishlistStore::new(identity, Arc::clone(&remote), Arc::clone(&catalog));
    (remote, catalog, wishlist)
}

#[tokio::test]
async fn test_toggle_adds_then_removes() {
    let (remote, _catalog, wishlist) = wishlist_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    let p1 = ProductId::new("p1");

    assert_eq!(wishlist.toggle(&p1).await.unwrap(), ToggleOutcome::Added);
    assert!(wishlist.contains(&p1).await);
    assert_eq!(wishlist.count().await, 1);

    assert_eq!(wishlist.toggle(&p1).await.unwrap(), ToggleOutcome::Removed);
    assert!(!wishlist.contains(&p1).await);
    assert_eq!(wishlist.count().await, 0);
    assert!(remote.stored(CollectionKind::Wishlist, &shopper()).is_empty());
}

#[tokio::test]
async fn test_duplicate_add_leaves_snapshot_untouched_until_refresh() {
    let (remote, _catalog, wishlist) = wishlist_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    let p1 = ProductId::new("p1");

    // A concurrent session already saved the product; this store has not
    // refreshed yet, so its snapshot is empty.
    remote.insert_row(CollectionKind::Wishlist, &shopper(), &p1, 1);

    let outcome = wishlist.add(&p1).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Duplicate);
    assert!(wishlist.snapshot().await.is_empty());

    // The next refresh reconciles the snapshot with the remote truth.
    wishlist.refresh().await.unwrap();
    assert_eq!(wishlist.count().await, 1);
    assert!(wishlist.contains(&p1).await);
}

#[tokio::test]
async fn test_remove_by_row_id() {
    let (remote, _catalog, wishlist) = wishlist_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    let p1 = ProductId::new("p1");

    wishlist.add(&p1).await.unwrap();
    let row_id = wishlist.row_for_product(&p1).await.unwrap();

    let outcome = wishlist.remove(&row_id).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert!(!wishlist.contains(&p1).await);
    assert!(wishlist.row_for_product(&p1).await.is_none());
}

#[tokio::test]
async fn test_toggle_against_concurrent_insert_is_already_present() {
    let (remote, _catalog, wishlist) = wishlist_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    let p1 = ProductId::new("p1");

    // The snapshot says absent, but another session inserted the row.
    remote.insert_row(CollectionKind::Wishlist, &shopper(), &p1, 1);

    let outcome = wishlist.toggle(&p1).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::AlreadyPresent);
    // The losing toggle still leaves the store reconciled.
    assert!(wishlist.contains(&p1).await);
    assert_eq!(wishlist.count().await, 1);
}

#[tokio::test]
async fn test_anonymous_mutations_are_rejected_without_remote_calls() {
    let (remote, _catalog, wishlist) = wishlist_fixture(None);
    let p1 = ProductId::new("p1");

    assert!(matches!(
        wishlist.add(&p1).await.unwrap_err(),
        StoreError::AuthenticationRequired
    ));
    assert!(matches!(
        wishlist.toggle(&p1).await.unwrap_err(),
        StoreError::AuthenticationRequired
    ));
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn test_wishlist_rows_have_unit_quantity() {
    let (remote, _catalog, wishlist) = wishlist_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));

    wishlist.add(&ProductId::new("p1")).await.unwrap();

    let snapshot = wishlist.snapshot().await;
    assert_eq!(snapshot.rows()[0].quantity, 1);
}

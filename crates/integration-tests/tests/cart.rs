//! Cart store behavior against the in-memory remote store.

use std::sync::Arc;

use marche_core::{Price, ProductId, UserId};
use marche_integration_tests::{MockRemoteStore, StaticCatalog, product, shopper};
use marche_storefront::error::StoreError;
use marche_storefront::collections::{CartStore, CollectionKind, MutationOutcome};

type TestCart = CartStore<Arc<MockRemoteStore>, Arc<StaticCatalog>>;

fn cart_fixture(identity: Option<UserId>) -> (Arc<MockRemoteStore>, Arc<StaticCatalog>, TestCart) {
    let remote = Arc::new(MockRemoteStore::new());
    let catalog = Arc::new(StaticCatalog::new());
    let cart = CartStore::new(identity, Arc::clone(&remote), Arc::clone(&catalog));
    (remote, catalog, cart)
}

#[tokio::test]
async fn test_add_reflects_in_snapshot() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));

    let outcome = cart.add(&ProductId::new("p1"), 2).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);

    let snapshot = cart.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    let row = &snapshot.rows()[0];
    assert_eq!(row.product_id, ProductId::new("p1"));
    assert_eq!(row.quantity, 2);
    assert_eq!(row.product.title, "Panier en osier");
}

#[tokio::test]
async fn test_total_and_item_count_over_lines() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    remote.insert_product(product("p2", "Tissu wax", 44_995));

    cart.add(&ProductId::new("p1"), 2).await.unwrap();
    cart.add(&ProductId::new("p2"), 1).await.unwrap();

    assert_eq!(cart.total().await, Price::fcfa(74_895));
    assert_eq!(cart.item_count().await, 3);
    assert!(cart.contains(&ProductId::new("p1")).await);
    assert!(!cart.contains(&ProductId::new("p3")).await);
}

#[tokio::test]
async fn test_anonymous_add_is_rejected_before_any_remote_call() {
    let (remote, _catalog, cart) = cart_fixture(None);
    remote.insert_product(product("p1", "Panier en osier", 14_950));

    let err = cart.add(&ProductId::new("p1"), 1).await.unwrap_err();
    assert!(matches!(err, StoreError::AuthenticationRequired));
    assert_eq!(remote.call_count(), 0);

    // Refresh on an anonymous store is a no-op, not an error.
    cart.refresh().await.unwrap();
    assert!(cart.snapshot().await.is_empty());
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn test_refresh_failure_preserves_snapshot() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    cart.add(&ProductId::new("p1"), 1).await.unwrap();

    remote.set_unavailable(true);
    let err = cart.refresh().await.unwrap_err();
    assert!(matches!(err, StoreError::RemoteUnavailable(_)));

    // The last good snapshot stays visible.
    assert_eq!(cart.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_orphan_rows_are_dropped_at_refresh() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    // "gone" has no product in the remote join and none in the catalog.
    remote.insert_row(CollectionKind::Cart, &shopper(), &ProductId::new("p1"), 1);
    remote.insert_row(CollectionKind::Cart, &shopper(), &ProductId::new("gone"), 3);

    cart.refresh().await.unwrap();

    let snapshot = cart.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.rows()[0].product_id, ProductId::new("p1"));
}

#[tokio::test]
async fn test_rows_hydrate_through_catalog() {
    let (remote, catalog, cart) = cart_fixture(Some(shopper()));
    // The listing response carries no embedded product, but the catalog
    // still knows it.
    catalog.insert(product("p1", "Panier en osier", 14_950));
    remote.insert_row(CollectionKind::Cart, &shopper(), &ProductId::new("p1"), 2);

    cart.refresh().await.unwrap();

    let snapshot = cart.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.rows()[0].product.title, "Panier en osier");
}

#[tokio::test]
async fn test_set_quantity_updates_line() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    cart.add(&ProductId::new("p1"), 1).await.unwrap();
    let row_id = cart.snapshot().await.rows()[0].id.clone();

    let outcome = cart.set_quantity(&row_id, 5).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(cart.snapshot().await.rows()[0].quantity, 5);
    assert_eq!(cart.item_count().await, 5);
}

#[tokio::test]
async fn test_set_quantity_zero_removes_line() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    cart.add(&ProductId::new("p1"), 2).await.unwrap();
    let row_id = cart.snapshot().await.rows()[0].id.clone();

    let outcome = cart.set_quantity(&row_id, 0).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert!(cart.snapshot().await.is_empty());
    assert!(remote.stored(CollectionKind::Cart, &shopper()).is_empty());
}

#[tokio::test]
async fn test_clear_empties_snapshot_immediately() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    remote.insert_product(product("p2", "Tissu wax", 44_995));
    cart.add(&ProductId::new("p1"), 2).await.unwrap();
    cart.add(&ProductId::new("p2"), 1).await.unwrap();

    cart.clear().await.unwrap();

    assert!(cart.snapshot().await.is_empty());
    assert_eq!(cart.item_count().await, 0);
    assert!(remote.stored(CollectionKind::Cart, &shopper()).is_empty());
}

#[tokio::test]
async fn test_remove_of_vanished_row_is_already_gone() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));
    cart.add(&ProductId::new("p1"), 1).await.unwrap();
    let row_id = cart.snapshot().await.rows()[0].id.clone();

    // Another session deletes the row behind our back.
    use marche_storefront::remote::RemoteStore;
    remote
        .delete_row(CollectionKind::Cart, &row_id)
        .await
        .unwrap();

    let outcome = cart.remove(&row_id).await.unwrap();
    assert_eq!(outcome, MutationOutcome::AlreadyGone);
    assert!(cart.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_repeated_add_merges_quantities() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));

    assert_eq!(
        cart.add(&ProductId::new("p1"), 2).await.unwrap(),
        MutationOutcome::Applied
    );
    assert_eq!(
        cart.add(&ProductId::new("p1"), 3).await.unwrap(),
        MutationOutcome::Applied
    );

    let snapshot = cart.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.rows()[0].quantity, 5);
    assert_eq!(cart.item_count().await, 5);
}

#[tokio::test]
async fn test_zero_quantity_add_is_clamped_to_one() {
    let (remote, _catalog, cart) = cart_fixture(Some(shopper()));
    remote.insert_product(product("p1", "Panier en osier", 14_950));

    cart.add(&ProductId::new("p1"), 0).await.unwrap();
    assert_eq!(cart.snapshot().await.rows()[0].quantity, 1);
}

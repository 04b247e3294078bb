//! Per-key serialization of remote mutations.
//!
//! Without ordering, two near-simultaneous mutations on the same product
//! interleave their remote calls and trailing re-fetches, and the local and
//! remote views can end up permanently disagreeing. The serializer hands out
//! one async mutex per (collection, product) key; holding the guard across
//! the remote call and the trailing re-fetch gives strict submission-order
//! execution per key. Tokio mutexes wake waiters in FIFO order, so queued
//! requests run in the order they were submitted. Requests for different
//! keys never contend.
//!
//! No cancellation or coalescing: a queued request that has become redundant
//! still executes, and the remote store's state after the last one settles
//! is authoritative.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use marche_core::ProductId;

use super::CollectionKind;

/// Identifies the serialization domain of one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationKey {
    pub kind: CollectionKind,
    pub product_id: ProductId,
}

impl MutationKey {
    #[must_use]
    pub const fn new(kind: CollectionKind, product_id: ProductId) -> Self {
        Self { kind, product_id }
    }
}

/// Hands out per-key mutation guards.
///
/// The key map only ever grows, bounded by the number of distinct products a
/// shopper touches in one session - entries are a pointer each, so no
/// eviction is done.
#[derive(Debug, Default)]
pub struct MutationSerializer {
    slots: Mutex<HashMap<MutationKey, Arc<AsyncMutex<()>>>>,
}

impl MutationSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard for `key`, waiting behind any in-flight mutation on
    /// the same key. Guards for distinct keys are independent.
    pub async fn acquire(&self, key: MutationKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        slot.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    fn key(product: &str) -> MutationKey {
        MutationKey::new(CollectionKind::Wishlist, ProductId::new(product))
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let serializer = MutationSerializer::new();

        let guard = serializer.acquire(key("p1")).await;
        let blocked = timeout(Duration::from_millis(20), serializer.acquire(key("p1"))).await;
        assert!(blocked.is_err(), "second acquire should wait");

        drop(guard);
        let reacquired = timeout(Duration::from_millis(20), serializer.acquire(key("p1"))).await;
        assert!(reacquired.is_ok(), "guard should be free after drop");
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let serializer = MutationSerializer::new();

        let _cart = serializer
            .acquire(MutationKey::new(CollectionKind::Cart, ProductId::new("p1")))
            .await;
        let _wishlist = timeout(Duration::from_millis(20), serializer.acquire(key("p1"))).await;
        assert!(
            _wishlist.is_ok(),
            "same product in a different collection is a different key"
        );

        let other = timeout(Duration::from_millis(20), serializer.acquire(key("p2"))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_waiters_run_in_submission_order() {
        let serializer = Arc::new(MutationSerializer::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = serializer.acquire(key("p1")).await;

        let mut waiters = Vec::new();
        for i in 0..3 {
            let serializer = Arc::clone(&serializer);
            let order = Arc::clone(&order);
            waiters.push(tokio::spawn(async move {
                let _guard = serializer.acquire(key("p1")).await;
                order.lock().unwrap().push(i);
            }));
            // Let the waiter reach the queue before submitting the next one.
            tokio::task::yield_now().await;
        }

        drop(first);
        for waiter in waiters {
            waiter.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}

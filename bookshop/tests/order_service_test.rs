//! Checkout tests over the in-memory fakes.
//!
//! Covers the allocation race, the price snapshot, failure composition
//! after commit, and a property test for no-oversell.
//!
//! Run with: `cargo test -p bookshop --test order_service_test`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

mod common;

use bookshop::{BookQuery, OrderService};
use bookshop_core::providers::CartStore;
use bookshop_core::{ConflictReason, OrderedBook, ShopError, UserId, keys};
use common::{LateAddCartStore, Shop};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn user(name: &str) -> UserId {
    UserId::new(name)
}

#[tokio::test]
async fn test_checkout_places_order_and_cleans_up() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let dune = shop
        .store
        .seed_book_priced("Dune", Decimal::new(1250, 2), 5, fiction.id);
    let emma = shop
        .store
        .seed_book_priced("Emma", Decimal::new(800, 2), 2, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, dune.id).await.unwrap();
    shop.cart.add_item(&alice, dune.id).await.unwrap();
    shop.cart.add_item(&alice, emma.id).await.unwrap();

    let order = shop.orders.create(&alice).await.unwrap();

    assert_eq!(order.user_id, alice);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.units(), 3);
    assert_eq!(order.total(), Decimal::new(3300, 2));

    assert_eq!(shop.store.inventory(dune.id), Some(3));
    assert_eq!(shop.store.inventory(emma.id), Some(1));
    assert!(shop.cart.list_items(&alice).await.unwrap().is_empty());
    assert!(shop.cache.keys().is_empty());

    let published = shop.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].order_id, order.id);
    assert_eq!(published[0].user_id, alice);
    assert!(published[0].books.contains(&OrderedBook {
        book_id: dune.id,
        quantity: 2
    }));
    assert!(published[0].books.contains(&OrderedBook {
        book_id: emma.id,
        quantity: 1
    }));
}

#[tokio::test]
async fn test_order_records_price_at_checkout() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 5, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, book.id).await.unwrap();

    // Price changes between add and checkout: checkout uses the new price
    shop.store.set_price(book.id, Decimal::new(1500, 2));
    let order = shop.orders.create(&alice).await.unwrap();
    assert_eq!(order.items[0].price, Decimal::new(1500, 2));

    // Later edits do not rewrite history
    shop.store.set_price(book.id, Decimal::new(9900, 2));
    let orders = shop.orders.list_by_user(&alice).await.unwrap();
    assert_eq!(orders[0].items[0].price, Decimal::new(1500, 2));
}

#[tokio::test]
async fn test_empty_cart_is_rejected_without_writes() {
    let shop = Shop::new();
    let writes = shop.store.write_count();

    let result = shop.orders.create(&user("alice")).await;

    assert_eq!(result, Err(ShopError::EmptyCart));
    assert_eq!(shop.store.write_count(), writes);
    assert!(shop.publisher.published().is_empty());
}

#[tokio::test]
async fn test_last_copy_goes_to_first_checkout() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Last Copy", 1, fiction.id);
    let (alice, bob) = (user("alice"), user("bob"));

    // Both soft claims succeed
    shop.cart.add_item(&alice, book.id).await.unwrap();
    shop.cart.add_item(&bob, book.id).await.unwrap();

    shop.orders.create(&alice).await.unwrap();
    assert_eq!(shop.store.inventory(book.id), Some(0));

    let result = shop.orders.create(&bob).await;
    assert_eq!(
        result,
        Err(ShopError::Conflict {
            book_id: book.id,
            reason: ConflictReason::InsufficientStock {
                requested: 1,
                available: 0
            },
        })
    );
    assert_eq!(shop.store.inventory(book.id), Some(0));
    assert_eq!(shop.store.order_count(), 1);

    // Bob keeps his cart and his marker
    let items = shop.cart.list_items(&bob).await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(shop.cache.contains(&keys::reservation(&bob, book.id)));
}

#[tokio::test]
async fn test_one_short_line_fails_the_whole_checkout() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let plenty = shop.store.seed_book("Plenty", 10, fiction.id);
    let scarce = shop.store.seed_book("Scarce", 2, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, plenty.id).await.unwrap();
    shop.cart.add_item(&alice, scarce.id).await.unwrap();
    shop.cart.add_item(&alice, scarce.id).await.unwrap();

    shop.store.set_inventory(scarce.id, 1);
    let result = shop.orders.create(&alice).await;

    assert!(matches!(result, Err(ShopError::Conflict { book_id, .. }) if book_id == scarce.id));
    assert_eq!(shop.store.inventory(plenty.id), Some(10));
    assert_eq!(shop.store.inventory(scarce.id), Some(1));
    assert_eq!(shop.cart.list_items(&alice).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_deleted_book_is_not_found() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Withdrawn", 3, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, book.id).await.unwrap();
    shop.catalog.delete_book(book.id).await.unwrap();

    let result = shop.orders.create(&alice).await;

    assert!(matches!(
        result,
        Err(ShopError::NotFound { entity: "book", ref id }) if *id == book.id.to_string()
    ));
    assert_eq!(shop.store.order_count(), 0);
    assert_eq!(shop.cart.list_items(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_book_added_during_checkout_stays_in_cart() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let dune = shop.store.seed_book("Dune", 3, fiction.id);
    let emma = shop.store.seed_book("Emma", 3, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, dune.id).await.unwrap();

    let orders = OrderService::new(
        Arc::new(shop.store.clone()),
        Arc::new(shop.late_add(&alice, emma.id)),
        Arc::new(shop.store.clone()),
        Arc::new(shop.cache.clone()),
        Arc::new(shop.publisher.clone()),
    );

    let order = orders.create(&alice).await.unwrap();

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].book_id, dune.id);
    let left = shop.cart.list_items(&alice).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].book_id, emma.id);
    assert_eq!(
        shop.cache.keys(),
        vec![keys::reservation(&alice, emma.id)]
    );
    assert_eq!(shop.store.inventory(emma.id), Some(3));
}

#[tokio::test]
async fn test_failed_order_write_leaves_everything_in_place() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, book.id).await.unwrap();
    shop.store.fail_order_writes(true);

    let result = shop.orders.create(&alice).await;

    assert!(matches!(result, Err(ShopError::Infrastructure(_))));
    assert_eq!(shop.store.inventory(book.id), Some(3));
    assert_eq!(shop.cart.list_items(&alice).await.unwrap().len(), 1);
    assert!(shop.publisher.published().is_empty());
}

#[tokio::test]
async fn test_publish_failure_keeps_the_order() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, book.id).await.unwrap();
    shop.publisher.set_failing(true);

    let result = shop.orders.create(&alice).await;

    let order_id = match result {
        Err(ShopError::Publish { order_id, .. }) => order_id,
        other => panic!("expected a publish error, got {other:?}"),
    };
    let orders = shop.orders.list_by_user(&alice).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(shop.store.inventory(book.id), Some(2));
    assert!(shop.cart.list_items(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cleanup_failures_do_not_fail_checkout() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);
    let alice = user("alice");
    shop.cart.add_item(&alice, book.id).await.unwrap();
    shop.store.fail_cart_clear(true);
    shop.cache.set_failing(true);

    let order = shop.orders.create(&alice).await.unwrap();

    assert_eq!(order.units(), 1);
    assert_eq!(shop.store.inventory(book.id), Some(2));
    assert_eq!(shop.publisher.published().len(), 1);
}

#[tokio::test]
async fn test_checkout_invalidates_cached_listing() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Last Copy", 1, fiction.id);
    let alice = user("alice");

    let listed = shop.catalog.list_books(&BookQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(shop.cache.contains(keys::book_list_all()));

    shop.cart.add_item(&alice, book.id).await.unwrap();
    shop.orders.create(&alice).await.unwrap();

    assert!(!shop.cache.contains(keys::book_list_all()));
    let listed = shop.catalog.list_books(&BookQuery::default()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_orders_are_listed_newest_first() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 5, fiction.id);
    let alice = user("alice");

    shop.cart.add_item(&alice, book.id).await.unwrap();
    let first = shop.orders.create(&alice).await.unwrap();
    shop.cart.add_item(&alice, book.id).await.unwrap();
    let second = shop.orders.create(&alice).await.unwrap();

    let orders = shop.orders.list_by_user(&alice).await.unwrap();
    let ids: Vec<_> = orders.iter().map(|order| order.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(shop.orders.list_by_user(&user("bob")).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_never_oversell() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Limited", 3, fiction.id);

    let buyers: Vec<UserId> = (0..10).map(|i| user(&format!("buyer-{i}"))).collect();
    for buyer in &buyers {
        shop.cart.add_item(buyer, book.id).await.unwrap();
    }

    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer| {
            let orders = shop.orders.clone();
            tokio::spawn(async move { orders.create(&buyer).await })
        })
        .collect();

    let mut placed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(ShopError::Conflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(conflicts, 7);
    assert_eq!(shop.store.inventory(book.id), Some(0));
    assert_eq!(shop.store.order_count(), 3);
    assert_eq!(shop.publisher.published().len(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// However carts are filled, sequential checkouts sell at most the
    /// initial stock and every rejected checkout leaves stock untouched.
    #[test]
    fn prop_checkouts_never_oversell(
        initial in 0u32..6,
        wants in proptest::collection::vec(1u32..4, 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let shop = Shop::new();
            let fiction = shop.store.seed_category("Fiction");
            let book = shop.store.seed_book("Contended", initial, fiction.id);

            let mut sold = 0;
            for (i, want) in wants.iter().enumerate() {
                let buyer = user(&format!("buyer-{i}"));
                // Fill the cart directly; the add-time checks are not under test here
                for _ in 0..*want {
                    shop.store.add_item(&buyer, book.id).await.unwrap();
                }

                let before = shop.store.inventory(book.id).unwrap();
                match shop.orders.create(&buyer).await {
                    Ok(order) => {
                        sold += order.units();
                        prop_assert_eq!(shop.store.inventory(book.id), Some(before - want));
                    }
                    Err(ShopError::Conflict { .. }) => {
                        prop_assert!(before < *want);
                        prop_assert_eq!(shop.store.inventory(book.id), Some(before));
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                }
            }

            prop_assert!(sold <= u64::from(initial));
            prop_assert_eq!(
                shop.store.inventory(book.id),
                Some(initial - u32::try_from(sold).unwrap())
            );
            Ok(())
        })?;
    }
}

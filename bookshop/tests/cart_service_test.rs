//! Cart service tests over the in-memory fakes.
//!
//! Run with: `cargo test -p bookshop --test cart_service_test`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

mod common;

use bookshop::CartService;
use bookshop::config::ShopConfig;
use bookshop_core::providers::CartStore;
use bookshop_core::{BookId, ShopError, UserId, keys};
use bookshop_testing::mocks::epoch;
use common::Shop;
use std::sync::Arc;

fn alice() -> UserId {
    UserId::new("alice")
}

#[tokio::test]
async fn test_first_add_creates_cart_and_marker() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);

    let item = shop.cart.add_item(&alice(), book.id).await.unwrap();

    assert_eq!(item.quantity, 1);
    assert_eq!(item.book.as_ref().map(|b| b.id), Some(book.id));

    let marker = keys::reservation(&alice(), book.id);
    assert!(shop.cache.contains(&marker));
    assert_eq!(
        shop.cache.expires_at(&marker),
        Some(epoch() + chrono::Duration::seconds(1800))
    );
    // Adding never touches stock
    assert_eq!(shop.store.inventory(book.id), Some(3));
}

#[tokio::test]
async fn test_repeated_adds_accumulate_into_one_line() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);

    shop.cart.add_item(&alice(), book.id).await.unwrap();
    let item = shop.cart.add_item(&alice(), book.id).await.unwrap();

    assert_eq!(item.quantity, 2);
    let items = shop.cart.list_items(&alice()).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
}

#[tokio::test]
async fn test_out_of_stock_book_is_rejected_without_writes() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Sold Out", 0, fiction.id);
    let writes = shop.store.write_count();

    let result = shop.cart.add_item(&alice(), book.id).await;

    assert!(matches!(result, Err(ShopError::OutOfStock { book_id }) if book_id == book.id));
    assert_eq!(shop.store.write_count(), writes);
    assert!(shop.cache.keys().is_empty());
}

#[tokio::test]
async fn test_cart_cannot_hold_more_than_stock() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Last Copy", 1, fiction.id);

    shop.cart.add_item(&alice(), book.id).await.unwrap();
    let result = shop.cart.add_item(&alice(), book.id).await;

    assert!(matches!(
        result,
        Err(ShopError::InsufficientStock {
            in_cart: 1,
            available: 1,
            ..
        })
    ));
    assert_eq!(
        shop.store.get_item_quantity(&alice(), book.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_unknown_book_is_not_found() {
    let shop = Shop::new();

    let result = shop.cart.add_item(&alice(), BookId::new(999)).await;

    assert!(matches!(result, Err(ShopError::NotFound { entity: "book", .. })));
}

#[tokio::test]
async fn test_soft_claims_from_different_users_coexist() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Last Copy", 1, fiction.id);
    let bob = UserId::new("bob");

    shop.cart.add_item(&alice(), book.id).await.unwrap();
    shop.cart.add_item(&bob, book.id).await.unwrap();

    assert!(shop.cache.contains(&keys::reservation(&alice(), book.id)));
    assert!(shop.cache.contains(&keys::reservation(&bob, book.id)));
    assert_eq!(shop.store.inventory(book.id), Some(1));
}

#[tokio::test]
async fn test_remove_item_drops_line_and_marker() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let dune = shop.store.seed_book("Dune", 3, fiction.id);
    let emma = shop.store.seed_book("Emma", 3, fiction.id);
    shop.cart.add_item(&alice(), dune.id).await.unwrap();
    shop.cart.add_item(&alice(), dune.id).await.unwrap();
    shop.cart.add_item(&alice(), emma.id).await.unwrap();

    shop.cart.remove_item(&alice(), dune.id).await.unwrap();

    let items = shop.cart.list_items(&alice()).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].book_id, emma.id);
    assert!(!shop.cache.contains(&keys::reservation(&alice(), dune.id)));
    assert!(shop.cache.contains(&keys::reservation(&alice(), emma.id)));
}

#[tokio::test]
async fn test_removing_absent_line_is_not_found() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);

    let result = shop.cart.remove_item(&alice(), book.id).await;

    assert!(matches!(result, Err(ShopError::NotFound { .. })));
}

#[tokio::test]
async fn test_clear_drops_every_line_and_marker() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let dune = shop.store.seed_book("Dune", 3, fiction.id);
    let emma = shop.store.seed_book("Emma", 3, fiction.id);
    shop.cart.add_item(&alice(), dune.id).await.unwrap();
    shop.cart.add_item(&alice(), emma.id).await.unwrap();

    shop.cart.clear(&alice()).await.unwrap();

    assert!(shop.cart.list_items(&alice()).await.unwrap().is_empty());
    assert!(shop.cache.keys().is_empty());
}

#[tokio::test]
async fn test_clear_drops_markers_of_lines_added_meanwhile() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let dune = shop.store.seed_book("Dune", 3, fiction.id);
    let emma = shop.store.seed_book("Emma", 3, fiction.id);
    shop.cart.add_item(&alice(), dune.id).await.unwrap();
    let cart = CartService::new(
        Arc::new(shop.store.clone()),
        Arc::new(shop.late_add(&alice(), emma.id)),
        Arc::new(shop.cache.clone()),
        ShopConfig::default().reservation_ttl(),
    );

    cart.clear(&alice()).await.unwrap();

    assert!(shop.cart.list_items(&alice()).await.unwrap().is_empty());
    assert!(shop.cache.keys().is_empty());
}

#[tokio::test]
async fn test_clear_without_cart_is_a_no_op() {
    let shop = Shop::new();
    shop.cart.clear(&alice()).await.unwrap();
}

#[tokio::test]
async fn test_missing_cart_is_not_found() {
    let shop = Shop::new();

    let result = shop.cart.get_by_user_id(&alice()).await;

    assert!(matches!(result, Err(ShopError::NotFound { entity: "cart", .. })));
    assert!(shop.cart.list_items(&alice()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_book_leaves_line_without_snapshot() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);
    shop.cart.add_item(&alice(), book.id).await.unwrap();

    shop.catalog.delete_book(book.id).await.unwrap();

    let cart = shop.cart.get_by_user_id(&alice()).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert!(cart.items[0].book.is_none());
}

#[tokio::test]
async fn test_marker_write_failure_does_not_fail_add() {
    let shop = Shop::new();
    let fiction = shop.store.seed_category("Fiction");
    let book = shop.store.seed_book("Dune", 3, fiction.id);
    shop.cache.set_failing(true);

    let item = shop.cart.add_item(&alice(), book.id).await.unwrap();

    assert_eq!(item.quantity, 1);
}

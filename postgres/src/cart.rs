//! Carts and cart lines.

use crate::rows::{CartItemRow, from_column};
use async_trait::async_trait;
use bookshop_core::providers::CartStore;
use bookshop_core::{BookId, Cart, CartId, CartItem, Result, ShopError, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// `PostgreSQL` cart store.
///
/// `UNIQUE (cart_id, book_id)` plus `ON CONFLICT ... DO UPDATE` gives
/// upsert-with-increment without a read-modify-write race.
#[derive(Clone)]
pub struct PostgresCartStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresCartStore {
    /// Create a new cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn get_cart(&self, user_id: &UserId) -> Result<Option<Cart>> {
        let row: Option<(i64, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to get cart: {e}")))?;

        let Some((id, created_at, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Cart {
            id: CartId::new(id),
            user_id: user_id.clone(),
            items: self.list_items(user_id).await?,
            created_at,
            updated_at,
        }))
    }

    async fn list_items(&self, user_id: &UserId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT ci.id, ci.cart_id, ci.book_id, ci.quantity, ci.reserved_at
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            WHERE c.user_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to list cart items: {e}")))?;

        rows.into_iter().map(CartItemRow::into_item).collect()
    }

    async fn add_item(&self, user_id: &UserId, book_id: BookId) -> Result<CartItem> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to begin transaction: {e}")))?;

        let (cart_id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
            RETURNING id
            ",
        )
        .bind(user_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to create cart: {e}")))?;

        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (cart_id, book_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (cart_id, book_id)
            DO UPDATE SET quantity = cart_items.quantity + 1, reserved_at = now()
            RETURNING id, cart_id, book_id, quantity, reserved_at
            ",
        )
        .bind(cart_id)
        .bind(book_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to add cart item: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to commit cart item: {e}")))?;

        tracing::debug!(user_id = %user_id, book_id = %book_id, cart_id, "Cart item upserted");
        row.into_item()
    }

    async fn remove_item(&self, user_id: &UserId, book_id: BookId) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.book_id = $2
            ",
        )
        .bind(user_id.as_str())
        .bind(book_id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to remove cart item: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: &UserId) -> Result<Vec<BookId>> {
        let removed: Vec<i64> = sqlx::query_scalar(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id AND c.user_id = $1
            RETURNING ci.book_id
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to clear cart: {e}")))?;

        Ok(removed.into_iter().map(BookId::new).collect())
    }

    async fn remove_items(&self, user_id: &UserId, book_ids: &[BookId]) -> Result<Vec<BookId>> {
        if book_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = book_ids.iter().map(|id| id.get()).collect();
        let removed: Vec<i64> = sqlx::query_scalar(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.book_id = ANY($2)
            RETURNING ci.book_id
            ",
        )
        .bind(user_id.as_str())
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to remove cart items: {e}")))?;

        Ok(removed.into_iter().map(BookId::new).collect())
    }

    async fn get_item_quantity(&self, user_id: &UserId, book_id: BookId) -> Result<u32> {
        let quantity: Option<i32> = sqlx::query_scalar(
            r"
            SELECT ci.quantity
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            WHERE c.user_id = $1 AND ci.book_id = $2
            ",
        )
        .bind(user_id.as_str())
        .bind(book_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to get cart quantity: {e}")))?;

        quantity.map_or(Ok(0), |q| from_column(q, "cart_items.quantity"))
    }
}

//! Orders and the atomic checkout write.

use crate::rows::{OrderItemRow, from_column, to_column};
use async_trait::async_trait;
use bookshop_core::providers::OrderStore;
use bookshop_core::{
    ConflictReason, NewOrder, Order, OrderId, OrderItem, Result, ShopError, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;

/// `PostgreSQL` order store.
///
/// `create_order_atomic` runs in one transaction under the default
/// `READ COMMITTED` isolation. Each decrement is a compare-and-decrement
/// (`WHERE inventory >= $2`); a concurrent checkout on the same row blocks on
/// the row lock and re-evaluates the guard after the first one commits.
#[derive(Clone)]
pub struct PostgresOrderStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order_atomic(&self, order: &NewOrder) -> Result<Order> {
        let started = Instant::now();

        // Lock rows in id order so concurrent checkouts cannot deadlock.
        let mut lines = order.items.clone();
        lines.sort_by_key(|item| item.book_id);

        // Dropping `tx` without commit rolls everything back, including on cancellation.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to begin transaction: {e}")))?;

        for item in &lines {
            let quantity = to_column(item.quantity)?;
            let updated = sqlx::query(
                r"
                UPDATE books
                SET inventory = inventory - $2, updated_at = now()
                WHERE id = $1 AND inventory >= $2
                ",
            )
            .bind(item.book_id.get())
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to decrement inventory: {e}")))?;

            if updated.rows_affected() == 0 {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT inventory FROM books WHERE id = $1")
                        .bind(item.book_id.get())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| {
                            ShopError::infrastructure(format!("Failed to read inventory: {e}"))
                        })?;

                tx.rollback().await.map_err(|e| {
                    ShopError::infrastructure(format!("Failed to roll back order: {e}"))
                })?;

                let Some(left) = available else {
                    tracing::info!(
                        user_id = %order.user_id,
                        book_id = %item.book_id,
                        "Checkout rejected: book deleted"
                    );
                    return Err(ShopError::not_found("book", item.book_id));
                };
                let reason = ConflictReason::InsufficientStock {
                    requested: item.quantity,
                    available: from_column(left, "books.inventory")?,
                };
                metrics::counter!("bookshop_order_guard_rejections_total").increment(1);
                tracing::info!(
                    user_id = %order.user_id,
                    book_id = %item.book_id,
                    %reason,
                    "Checkout rejected by inventory guard"
                );
                return Err(ShopError::Conflict {
                    book_id: item.book_id,
                    reason,
                });
            }
        }

        let (order_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO orders (user_id) VALUES ($1) RETURNING id, created_at",
        )
        .bind(order.user_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to insert order: {e}")))?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO order_items (order_id, book_id, price, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, book_id, price, quantity
                ",
            )
            .bind(order_id)
            .bind(item.book_id.get())
            .bind(item.price)
            .bind(to_column(item.quantity)?)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to insert order item: {e}")))?;
            items.push(row.into_item()?);
        }

        tx.commit()
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to commit order: {e}")))?;

        metrics::histogram!("bookshop_order_transaction_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            order_id,
            user_id = %order.user_id,
            lines = items.len(),
            "Order committed"
        );

        Ok(Order {
            id: OrderId::new(order_id),
            user_id: order.user_id.clone(),
            items,
            created_at,
        })
    }

    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let headers: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT id, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to list orders: {e}")))?;

        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = headers.iter().map(|(id, _)| *id).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, book_id, price, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to list order items: {e}")))?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            by_order.entry(order_id).or_default().push(row.into_item()?);
        }

        Ok(headers
            .into_iter()
            .map(|(id, created_at)| Order {
                id: OrderId::new(id),
                user_id: user_id.clone(),
                items: by_order.remove(&id).unwrap_or_default(),
                created_at,
            })
            .collect())
    }
}

//! Row types and column conversions.

use bookshop_core::{
    Book, BookId, CartId, CartItem, CartItemId, Category, CategoryId, OrderId, OrderItem,
    OrderItemId, Result, ShopError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    id: i64,
    title: String,
    author: String,
    year: i32,
    price: Decimal,
    category_id: i64,
    inventory: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookRow {
    pub(crate) fn into_book(self) -> Result<Book> {
        Ok(Book {
            id: BookId::new(self.id),
            title: self.title,
            author: self.author,
            year: self.year,
            price: self.price,
            category_id: CategoryId::new(self.category_id),
            inventory: from_column(self.inventory, "books.inventory")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CategoryRow {
    id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartItemRow {
    id: i64,
    cart_id: i64,
    book_id: i64,
    quantity: i32,
    reserved_at: DateTime<Utc>,
}

impl CartItemRow {
    pub(crate) fn into_item(self) -> Result<CartItem> {
        Ok(CartItem {
            id: CartItemId::new(self.id),
            cart_id: CartId::new(self.cart_id),
            book_id: BookId::new(self.book_id),
            quantity: from_column(self.quantity, "cart_items.quantity")?,
            reserved_at: self.reserved_at,
            book: None,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderItemRow {
    pub(crate) id: i64,
    pub(crate) order_id: i64,
    pub(crate) book_id: i64,
    pub(crate) price: Decimal,
    pub(crate) quantity: i32,
}

impl OrderItemRow {
    pub(crate) fn into_item(self) -> Result<OrderItem> {
        Ok(OrderItem {
            id: OrderItemId::new(self.id),
            order_id: OrderId::new(self.order_id),
            book_id: BookId::new(self.book_id),
            price: self.price,
            quantity: from_column(self.quantity, "order_items.quantity")?,
        })
    }
}

/// Read a non-negative INTEGER column.
pub(crate) fn from_column(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ShopError::infrastructure(format!("negative value {value} in {column}")))
}

/// Bind a count as INTEGER.
pub(crate) fn to_column(value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| ShopError::validation(format!("quantity {value} exceeds the supported range")))
}

//! Domain types for the bookshop.
//!
//! Identifiers are newtypes so a `BookId` can never be passed where a
//! `CategoryId` is expected. Inventory and quantities are unsigned: a
//! negative stock level is unrepresentable once input has been validated.

use crate::error::{Result, ShopError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Book identifier.
    BookId
);
numeric_id!(
    /// Category identifier.
    CategoryId
);
numeric_id!(
    /// Cart identifier.
    CartId
);
numeric_id!(
    /// Cart line identifier.
    CartItemId
);
numeric_id!(
    /// Order identifier.
    OrderId
);
numeric_id!(
    /// Order line identifier.
    OrderItemId
);

/// Authenticated user identifier (the identity provider's subject claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from the subject of a validated token.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier
    pub id: BookId,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Publication year
    pub year: i32,
    /// Current unit price
    pub price: Decimal,
    /// Owning category
    pub category_id: CategoryId,
    /// Sellable units not yet allocated to a completed order
    pub inventory: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory > 0
    }

    /// Whether `quantity` units can be allocated right now.
    #[must_use]
    pub const fn can_fulfil(&self, quantity: u32) -> bool {
        self.inventory >= quantity
    }
}

/// Admin input for a new book, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Publication year
    pub year: i32,
    /// Unit price
    pub price: Decimal,
    /// Owning category
    pub category_id: CategoryId,
    /// Initial stock, as received from the caller
    pub inventory: i64,
}

impl BookDraft {
    /// Validate the draft and turn it into a [`NewBook`].
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Validation`] for blank text fields, a negative
    /// price, or an inventory outside `0..=u32::MAX`.
    pub fn validate(self) -> Result<NewBook> {
        let details = BookDetails {
            title: self.title,
            author: self.author,
            year: self.year,
            price: self.price,
            category_id: self.category_id,
        }
        .validate()?;

        if self.inventory < 0 {
            return Err(ShopError::validation("inventory must not be negative"));
        }
        let inventory = u32::try_from(self.inventory)
            .map_err(|_| ShopError::validation("inventory is too large"))?;

        Ok(NewBook { details, inventory })
    }
}

/// Editable book attributes. Inventory is absent: admin edits
/// never touch stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Publication year
    pub year: i32,
    /// Unit price
    pub price: Decimal,
    /// Owning category
    pub category_id: CategoryId,
}

impl BookDetails {
    /// Trim text fields and check them.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Validation`] for blank title/author or a negative price.
    pub fn validate(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let author = self.author.trim().to_string();
        if title.is_empty() {
            return Err(ShopError::validation("title is required"));
        }
        if author.is_empty() {
            return Err(ShopError::validation("author is required"));
        }
        if self.price.is_sign_negative() {
            return Err(ShopError::validation("price must not be negative"));
        }
        Ok(Self {
            title,
            author,
            ..self
        })
    }

    /// Overwrite the editable attributes of `book`.
    pub fn apply_to(self, book: &mut Book) {
        book.title = self.title;
        book.author = self.author;
        book.year = self.year;
        book.price = self.price;
        book.category_id = self.category_id;
    }
}

/// A validated book ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    /// Editable attributes
    pub details: BookDetails,
    /// Initial stock
    pub inventory: u32,
}

/// Listing filter for [`crate::providers::CatalogStore::list_books`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFilter {
    /// Restrict to these categories (empty means all)
    pub category_ids: Vec<CategoryId>,
    /// Hide books with zero inventory
    pub in_stock_only: bool,
    /// Page size
    pub limit: u32,
    /// Rows to skip
    pub offset: u32,
}

impl BookFilter {
    /// Storefront default: in-stock books, first page of `limit`.
    #[must_use]
    pub const fn storefront(limit: u32) -> Self {
        Self {
            category_ids: Vec::new(),
            in_stock_only: true,
            limit,
            offset: 0,
        }
    }

    /// Every book of one category regardless of stock.
    #[must_use]
    pub fn all_in_category(category_id: CategoryId, limit: u32) -> Self {
        Self {
            category_ids: vec![category_id],
            in_stock_only: false,
            limit,
            offset: 0,
        }
    }

    /// Whether `book` passes the category and stock criteria (ignores paging).
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        (!self.in_stock_only || book.in_stock())
            && (self.category_ids.is_empty() || self.category_ids.contains(&book.category_id))
    }
}

/// A book category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Identifier
    pub id: CategoryId,
    /// Display name
    pub name: String,
}

impl Category {
    /// Trim and check a category name.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Validation`] if the name is blank.
    pub fn normalize_name(name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShopError::validation("category name is required"));
        }
        Ok(name.to_string())
    }
}

// ============================================================================
// Cart
// ============================================================================

/// A user's cart. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Identifier
    pub id: CartId,
    /// Owner
    pub user_id: UserId,
    /// Lines, one per book
    pub items: Vec<CartItem>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Identifier
    pub id: CartItemId,
    /// Owning cart
    pub cart_id: CartId,
    /// Referenced book
    pub book_id: BookId,
    /// Units the user intends to buy
    pub quantity: u32,
    /// When the line was last claimed
    pub reserved_at: DateTime<Utc>,
    /// Current book snapshot, for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<Book>,
}

// ============================================================================
// Orders
// ============================================================================

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier
    pub id: OrderId,
    /// Buyer
    pub user_id: UserId,
    /// Purchased lines
    pub items: Vec<OrderItem>,
    /// Placement time
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// One purchased line. `price` is the unit price at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Identifier
    pub id: OrderItemId,
    /// Owning order
    pub order_id: OrderId,
    /// Purchased book
    pub book_id: BookId,
    /// Unit price snapshot
    pub price: Decimal,
    /// Units purchased
    pub quantity: u32,
}

/// Order to be written atomically by [`crate::providers::OrderStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Buyer
    pub user_id: UserId,
    /// Lines to persist, each decrementing its book's inventory
    pub items: Vec<NewOrderItem>,
}

/// Line of a [`NewOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    /// Purchased book
    pub book_id: BookId,
    /// Unit price snapshot
    pub price: Decimal,
    /// Units to allocate
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::ErrorKind;

    fn draft(inventory: i64) -> BookDraft {
        BookDraft {
            title: "  Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            year: 1965,
            price: Decimal::new(1299, 2),
            category_id: CategoryId::new(1),
            inventory,
        }
    }

    #[test]
    fn draft_validation_trims_and_accepts_zero_stock() {
        let book = draft(0).validate().unwrap();
        assert_eq!(book.details.title, "Dune");
        assert_eq!(book.inventory, 0);
    }

    #[test]
    fn draft_rejects_negative_inventory() {
        let err = draft(-1).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn draft_rejects_negative_price() {
        let mut d = draft(3);
        d.price = Decimal::new(-1, 0);
        assert_eq!(d.validate().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn blank_category_name_is_rejected() {
        assert!(Category::normalize_name("   ").is_err());
        assert_eq!(Category::normalize_name(" SciFi ").unwrap(), "SciFi");
    }

    #[test]
    fn order_total_multiplies_snapshot_price() {
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new("u"),
            created_at: Utc::now(),
            items: vec![
                OrderItem {
                    id: OrderItemId::new(1),
                    order_id: OrderId::new(1),
                    book_id: BookId::new(1),
                    price: Decimal::new(1000, 2),
                    quantity: 2,
                },
                OrderItem {
                    id: OrderItemId::new(2),
                    order_id: OrderId::new(1),
                    book_id: BookId::new(2),
                    price: Decimal::new(550, 2),
                    quantity: 1,
                },
            ],
        };
        assert_eq!(order.total(), Decimal::new(2550, 2));
        assert_eq!(order.units(), 3);
    }

    #[test]
    fn filter_matches_category_and_stock() {
        let now = Utc::now();
        let book = Book {
            id: BookId::new(7),
            title: "t".into(),
            author: "a".into(),
            year: 2000,
            price: Decimal::ONE,
            category_id: CategoryId::new(5),
            inventory: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(!BookFilter::storefront(100).matches(&book));
        assert!(BookFilter::all_in_category(CategoryId::new(5), 100).matches(&book));
        assert!(!BookFilter::all_in_category(CategoryId::new(6), 100).matches(&book));
    }

    proptest::proptest! {
        #[test]
        fn draft_inventory_accepted_iff_representable(inventory in proptest::num::i64::ANY) {
            let accepted = draft(inventory).validate().is_ok();
            proptest::prop_assert_eq!(accepted, u32::try_from(inventory).is_ok());
        }
    }
}

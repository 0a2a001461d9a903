//! In-memory catalog, cart and order store.
//!
//! One value implements all three store traits over shared tables, the way
//! a single Postgres pool backs the three production adapters. A single
//! mutex stands in for transactional isolation.

use crate::lock;
use async_trait::async_trait;
use bookshop_core::environment::Clock;
use bookshop_core::providers::{CartStore, CatalogStore, OrderStore};
use bookshop_core::{
    Book, BookDetails, BookFilter, BookId, Cart, CartId, CartItem, CartItemId, Category,
    CategoryId, ConflictReason, NewBook, NewOrder, Order, OrderId, OrderItem, OrderItemId,
    Result, ShopError, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct CartRow {
    id: CartId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    books: BTreeMap<BookId, Book>,
    categories: BTreeMap<CategoryId, Category>,
    carts: HashMap<UserId, CartRow>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    sequence: i64,
    writes: u64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn cart_id(&self, user_id: &UserId) -> Option<CartId> {
        self.carts.get(user_id).map(|row| row.id)
    }

    fn items_of(&self, cart_id: CartId) -> Vec<CartItem> {
        self.cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Faults {
    cart_clear: AtomicBool,
    order_writes: AtomicBool,
}

/// In-memory implementation of [`CatalogStore`], [`CartStore`] and [`OrderStore`].
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("tables", &self.tables)
            .field("faults", &self.faults)
            .finish_non_exhaustive()
    }
}

impl InMemoryStore {
    /// Create an empty store using `clock` for timestamps.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            faults: Arc::new(Faults::default()),
            clock,
        }
    }

    /// Insert a category directly (test setup).
    pub fn seed_category(&self, name: &str) -> Category {
        let mut tables = lock(&self.tables);
        let category = Category {
            id: CategoryId::new(tables.next_id()),
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        category
    }

    /// Insert a book priced at 10.00 directly (test setup).
    pub fn seed_book(&self, title: &str, inventory: u32, category_id: CategoryId) -> Book {
        self.seed_book_priced(title, Decimal::new(1000, 2), inventory, category_id)
    }

    /// Insert a book with an explicit price directly (test setup).
    pub fn seed_book_priced(
        &self,
        title: &str,
        price: Decimal,
        inventory: u32,
        category_id: CategoryId,
    ) -> Book {
        let now = self.clock.now();
        let mut tables = lock(&self.tables);
        let book = Book {
            id: BookId::new(tables.next_id()),
            title: title.to_string(),
            author: "Test Author".to_string(),
            year: 2000,
            price,
            category_id,
            inventory,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(book.id, book.clone());
        book
    }

    /// Current inventory of a book, `None` if it does not exist.
    #[must_use]
    pub fn inventory(&self, book_id: BookId) -> Option<u32> {
        lock(&self.tables).books.get(&book_id).map(|b| b.inventory)
    }

    /// Overwrite a book's stock, simulating a sale made elsewhere.
    pub fn set_inventory(&self, book_id: BookId, inventory: u32) {
        if let Some(book) = lock(&self.tables).books.get_mut(&book_id) {
            book.inventory = inventory;
        }
    }

    /// Overwrite a book's price, simulating an admin edit.
    pub fn set_price(&self, book_id: BookId, price: Decimal) {
        if let Some(book) = lock(&self.tables).books.get_mut(&book_id) {
            book.price = price;
        }
    }

    /// Number of mutating calls served so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        lock(&self.tables).writes
    }

    /// Number of committed orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.tables).orders.len()
    }

    /// Make [`CartStore::clear`] and [`CartStore::remove_items`] fail with an
    /// infrastructure error.
    pub fn fail_cart_clear(&self, fail: bool) {
        self.faults.cart_clear.store(fail, Ordering::SeqCst);
    }

    /// Make [`OrderStore::create_order_atomic`] fail with an infrastructure error.
    pub fn fail_order_writes(&self, fail: bool) {
        self.faults.order_writes.store(fail, Ordering::SeqCst);
    }

    fn drop_lines(&self, user_id: &UserId, doomed: impl Fn(BookId) -> bool) -> Result<Vec<BookId>> {
        if self.faults.cart_clear.load(Ordering::SeqCst) {
            return Err(ShopError::infrastructure("injected cart clear failure"));
        }
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        let Some(cart_id) = tables.cart_id(user_id) else {
            return Ok(Vec::new());
        };
        let mut removed = Vec::new();
        tables.cart_items.retain(|_, item| {
            let gone = item.cart_id == cart_id && doomed(item.book_id);
            if gone {
                removed.push(item.book_id);
            }
            !gone
        });
        Ok(removed)
    }
}

fn details_of(book: &Book) -> BookDetails {
    BookDetails {
        title: book.title.clone(),
        author: book.author.clone(),
        year: book.year,
        price: book.price,
        category_id: book.category_id,
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_book(&self, id: BookId) -> Result<Book> {
        lock(&self.tables)
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopError::not_found("book", id))
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let tables = lock(&self.tables);
        Ok(tables
            .books
            .values()
            .filter(|book| filter.matches(book))
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let now = self.clock.now();
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        let details = book.details.clone();
        let created = Book {
            id: BookId::new(tables.next_id()),
            title: details.title,
            author: details.author,
            year: details.year,
            price: details.price,
            category_id: details.category_id,
            inventory: book.inventory,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_book(&self, book: &Book) -> Result<Book> {
        let now = self.clock.now();
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        let stored = tables
            .books
            .get_mut(&book.id)
            .ok_or_else(|| ShopError::not_found("book", book.id))?;
        details_of(book).apply_to(stored);
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        tables
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ShopError::not_found("book", id))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(lock(&self.tables).categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        lock(&self.tables)
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopError::not_found("category", id))
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(lock(&self.tables)
            .categories
            .values()
            .find(|category| category.name == name)
            .cloned())
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        let category = Category {
            id: CategoryId::new(tables.next_id()),
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, category: &Category) -> Result<Category> {
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        let stored = tables
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| ShopError::not_found("category", category.id))?;
        stored.name.clone_from(&category.name);
        Ok(stored.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        tables
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ShopError::not_found("category", id))
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_cart(&self, user_id: &UserId) -> Result<Option<Cart>> {
        let tables = lock(&self.tables);
        Ok(tables.carts.get(user_id).map(|row| Cart {
            id: row.id,
            user_id: user_id.clone(),
            items: tables.items_of(row.id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn list_items(&self, user_id: &UserId) -> Result<Vec<CartItem>> {
        let tables = lock(&self.tables);
        Ok(tables
            .cart_id(user_id)
            .map(|cart_id| tables.items_of(cart_id))
            .unwrap_or_default())
    }

    async fn add_item(&self, user_id: &UserId, book_id: BookId) -> Result<CartItem> {
        let now = self.clock.now();
        let mut tables = lock(&self.tables);
        tables.writes += 1;

        let cart_id = match tables.cart_id(user_id) {
            Some(id) => id,
            None => {
                let id = CartId::new(tables.next_id());
                tables.carts.insert(
                    user_id.clone(),
                    CartRow {
                        id,
                        created_at: now,
                        updated_at: now,
                    },
                );
                id
            }
        };
        if let Some(row) = tables.carts.get_mut(user_id) {
            row.updated_at = now;
        }

        let existing = tables
            .cart_items
            .values_mut()
            .find(|item| item.cart_id == cart_id && item.book_id == book_id);
        if let Some(item) = existing {
            item.quantity += 1;
            item.reserved_at = now;
            return Ok(item.clone());
        }

        let item = CartItem {
            id: CartItemId::new(tables.next_id()),
            cart_id,
            book_id,
            quantity: 1,
            reserved_at: now,
            book: None,
        };
        tables.cart_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn remove_item(&self, user_id: &UserId, book_id: BookId) -> Result<bool> {
        let mut tables = lock(&self.tables);
        tables.writes += 1;
        let Some(cart_id) = tables.cart_id(user_id) else {
            return Ok(false);
        };
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|_, item| !(item.cart_id == cart_id && item.book_id == book_id));
        Ok(tables.cart_items.len() < before)
    }

    async fn clear(&self, user_id: &UserId) -> Result<Vec<BookId>> {
        self.drop_lines(user_id, |_| true)
    }

    async fn remove_items(&self, user_id: &UserId, book_ids: &[BookId]) -> Result<Vec<BookId>> {
        self.drop_lines(user_id, |book_id| book_ids.contains(&book_id))
    }

    async fn get_item_quantity(&self, user_id: &UserId, book_id: BookId) -> Result<u32> {
        let tables = lock(&self.tables);
        let Some(cart_id) = tables.cart_id(user_id) else {
            return Ok(0);
        };
        Ok(tables
            .cart_items
            .values()
            .find(|item| item.cart_id == cart_id && item.book_id == book_id)
            .map_or(0, |item| item.quantity))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order_atomic(&self, order: &NewOrder) -> Result<Order> {
        if self.faults.order_writes.load(Ordering::SeqCst) {
            return Err(ShopError::infrastructure("injected order write failure"));
        }
        let now = self.clock.now();
        let mut tables = lock(&self.tables);

        // Check every guard before touching anything.
        let mut remaining: HashMap<BookId, u32> = HashMap::new();
        for item in &order.items {
            let available = match remaining.get(&item.book_id) {
                Some(left) => *left,
                None => tables
                    .books
                    .get(&item.book_id)
                    .map(|book| book.inventory)
                    .ok_or_else(|| ShopError::not_found("book", item.book_id))?,
            };
            if available < item.quantity {
                return Err(ShopError::Conflict {
                    book_id: item.book_id,
                    reason: ConflictReason::InsufficientStock {
                        requested: item.quantity,
                        available,
                    },
                });
            }
            remaining.insert(item.book_id, available - item.quantity);
        }

        tables.writes += 1;
        for (book_id, left) in remaining {
            if let Some(book) = tables.books.get_mut(&book_id) {
                book.inventory = left;
            }
        }

        let order_id = OrderId::new(tables.next_id());
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            items.push(OrderItem {
                id: OrderItemId::new(tables.next_id()),
                order_id,
                book_id: item.book_id,
                price: item.price,
                quantity: item.quantity,
            });
        }
        let created = Order {
            id: order_id,
            user_id: order.user_id.clone(),
            items,
            created_at: now,
        };
        tables.orders.insert(order_id, created.clone());
        Ok(created)
    }

    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let tables = lock(&self.tables);
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| &order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

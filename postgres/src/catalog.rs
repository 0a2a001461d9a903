//! Books and categories.

use crate::rows::{BookRow, CategoryRow, to_column};
use async_trait::async_trait;
use bookshop_core::providers::CatalogStore;
use bookshop_core::{
    Book, BookFilter, BookId, Category, CategoryId, NewBook, Result, ShopError,
};
use sqlx::PgPool;

/// `PostgreSQL` catalog store.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Create a new catalog store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn category_write_error(e: sqlx::Error, action: &str) -> ShopError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return ShopError::validation("category name already exists");
        }
    }
    ShopError::infrastructure(format!("Failed to {action} category: {e}"))
}

fn book_write_error(e: sqlx::Error, action: &str) -> ShopError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return ShopError::validation("category does not exist");
        }
    }
    ShopError::infrastructure(format!("Failed to {action} book: {e}"))
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn get_book(&self, id: BookId) -> Result<Book> {
        sqlx::query_as::<_, BookRow>(
            r"
            SELECT id, title, author, year, price, category_id, inventory, created_at, updated_at
            FROM books
            WHERE id = $1
            ",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to get book: {e}")))?
        .ok_or_else(|| ShopError::not_found("book", id))?
        .into_book()
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let categories: Option<Vec<i64>> = if filter.category_ids.is_empty() {
            None
        } else {
            Some(filter.category_ids.iter().map(|id| id.get()).collect())
        };

        let rows = sqlx::query_as::<_, BookRow>(
            r"
            SELECT id, title, author, year, price, category_id, inventory, created_at, updated_at
            FROM books
            WHERE ($1::BIGINT[] IS NULL OR category_id = ANY($1))
              AND (NOT $2 OR inventory > 0)
            ORDER BY id
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(categories)
        .bind(filter.in_stock_only)
        .bind(i64::from(filter.limit))
        .bind(i64::from(filter.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopError::infrastructure(format!("Failed to list books: {e}")))?;

        rows.into_iter().map(BookRow::into_book).collect()
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let details = &book.details;
        sqlx::query_as::<_, BookRow>(
            r"
            INSERT INTO books (title, author, year, price, category_id, inventory)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, author, year, price, category_id, inventory, created_at, updated_at
            ",
        )
        .bind(&details.title)
        .bind(&details.author)
        .bind(details.year)
        .bind(details.price)
        .bind(details.category_id.get())
        .bind(to_column(book.inventory)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| book_write_error(e, "create"))?
        .into_book()
    }

    async fn update_book(&self, book: &Book) -> Result<Book> {
        sqlx::query_as::<_, BookRow>(
            r"
            UPDATE books
            SET title = $2,
                author = $3,
                year = $4,
                price = $5,
                category_id = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, author, year, price, category_id, inventory, created_at, updated_at
            ",
        )
        .bind(book.id.get())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(book.price)
        .bind(book.category_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| book_write_error(e, "update"))?
        .ok_or_else(|| ShopError::not_found("book", book.id))?
        .into_book()
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to delete book: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(ShopError::not_found("book", id));
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to list categories: {e}")))?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to get category: {e}")))?
            .map(Category::from)
            .ok_or_else(|| ShopError::not_found("category", id))
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShopError::infrastructure(format!("Failed to get category: {e}")))?;
        Ok(row.map(Category::from))
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        sqlx::query_as::<_, CategoryRow>("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map(Category::from)
            .map_err(|e| category_write_error(e, "create"))
    }

    async fn update_category(&self, category: &Category) -> Result<Category> {
        sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(category.id.get())
        .bind(&category.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| category_write_error(e, "update"))?
        .map(Category::from)
        .ok_or_else(|| ShopError::not_found("category", category.id))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return ShopError::validation("category still has books");
                    }
                }
                ShopError::infrastructure(format!("Failed to delete category: {e}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(ShopError::not_found("category", id));
        }
        Ok(())
    }
}

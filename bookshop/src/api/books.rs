//! Book endpoints.
//!
//! - GET /api/books - In-stock books, optionally by category
//! - GET /api/books/:id - One book
//! - POST /api/books - Create (admin)
//! - PUT /api/books/:id - Replace editable attributes (admin)
//! - DELETE /api/books/:id - Delete (admin)

use crate::auth::AdminUser;
use crate::server::state::AppState;
use crate::services::BookQuery;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use bookshop_core::{Book, BookDetails, BookDraft, BookId, CategoryId};
use bookshop_web::{AppError, WebResult};
use serde::Deserialize;

/// Query parameters for listing books.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksParams {
    /// Comma-separated category ids
    pub category_id: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Rows to skip
    pub offset: Option<u32>,
}

impl ListBooksParams {
    fn into_query(self) -> Result<BookQuery, AppError> {
        let category_ids = self
            .category_id
            .as_deref()
            .map(parse_category_ids)
            .transpose()?
            .unwrap_or_default();
        Ok(BookQuery {
            category_ids,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

fn parse_category_ids(raw: &str) -> Result<Vec<CategoryId>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map(CategoryId::new)
                .map_err(|_| AppError::bad_request(format!("invalid category_id: {part}")))
        })
        .collect()
}

/// List in-stock books.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListBooksParams>,
) -> WebResult<Json<Vec<Book>>> {
    let query = params.into_query()?;
    Ok(Json(state.catalog.list_books(&query).await?))
}

/// Get one book.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<Json<Book>> {
    Ok(Json(state.catalog.get_book(BookId::new(id)).await?))
}

/// Create a book.
pub async fn create_book(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(draft): Json<BookDraft>,
) -> WebResult<(StatusCode, Json<Book>)> {
    let book = state.catalog.create_book(draft).await?;
    tracing::debug!(admin = %admin.user_id, book_id = %book.id, "Book created via API");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace a book's editable attributes.
pub async fn update_book(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(details): Json<BookDetails>,
) -> WebResult<Json<Book>> {
    Ok(Json(
        state.catalog.update_book(BookId::new(id), details).await?,
    ))
}

/// Delete a book.
pub async fn delete_book(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<StatusCode> {
    state.catalog.delete_book(BookId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

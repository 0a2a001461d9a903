//! Cart endpoints. All require an authenticated user; the cart is always
//! the caller's own.

use crate::auth::AuthenticatedUser;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bookshop_core::{BookId, CartItem, ShopError, UserId};
use bookshop_web::WebResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body for adding a book to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Book to add one unit of
    pub book_id: BookId,
}

/// The caller's cart.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    /// Owner
    pub user_id: UserId,
    /// Lines with current book snapshots
    pub items: Vec<CartItem>,
    /// Units across all lines
    pub total_quantity: u64,
    /// Sum of current price times quantity; lines whose book was deleted
    /// contribute nothing
    pub subtotal: Decimal,
}

impl CartResponse {
    fn new(user_id: UserId, items: Vec<CartItem>) -> Self {
        let total_quantity = items.iter().map(|item| u64::from(item.quantity)).sum();
        let subtotal = items
            .iter()
            .filter_map(|item| {
                item.book
                    .as_ref()
                    .map(|book| book.price * Decimal::from(item.quantity))
            })
            .sum();
        Self {
            user_id,
            items,
            total_quantity,
            subtotal,
        }
    }
}

/// Get the caller's cart. A user without a cart sees an empty one.
pub async fn get_cart(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> WebResult<Json<CartResponse>> {
    let items = match state.cart.get_by_user_id(&user.user_id).await {
        Ok(cart) => cart.items,
        Err(ShopError::NotFound { .. }) => Vec::new(),
        Err(error) => return Err(error.into()),
    };
    Ok(Json(CartResponse::new(user.user_id, items)))
}

/// Add one unit of a book.
pub async fn add_to_cart(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> WebResult<(StatusCode, Json<CartItem>)> {
    let item = state.cart.add_item(&user.user_id, request.book_id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove a book's line entirely.
pub async fn remove_from_cart(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> WebResult<StatusCode> {
    state
        .cart
        .remove_item(&user.user_id, BookId::new(book_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the cart.
pub async fn clear_cart(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> WebResult<StatusCode> {
    state.cart.clear(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Order endpoints.
//!
//! - POST /api/orders - Check out the caller's cart
//! - GET /api/orders - The caller's orders, newest first

use crate::auth::AuthenticatedUser;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use bookshop_core::Order;
use bookshop_web::{CorrelationId, WebResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order with its computed total.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    /// The order
    #[serde(flatten)]
    pub order: Order,
    /// Sum of price snapshot times quantity
    pub total: Decimal,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total = order.total();
        Self { order, total }
    }
}

/// Place an order from the caller's cart.
pub async fn place_order(
    correlation_id: CorrelationId,
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> WebResult<(StatusCode, Json<OrderResponse>)> {
    tracing::info!(%correlation_id, user_id = %user.user_id, "Checkout requested");
    let order = state.orders.create(&user.user_id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// List the caller's orders.
pub async fn list_orders(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> WebResult<Json<Vec<OrderResponse>>> {
    let orders = state.orders.list_by_user(&user.user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

//! Category endpoints. Writes require the admin role.

use crate::auth::AdminUser;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bookshop_core::{Category, CategoryId};
use bookshop_web::WebResult;
use serde::Deserialize;

/// Body for creating or renaming a category.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    /// Display name
    pub name: String,
}

/// List all categories.
pub async fn list_categories(State(state): State<AppState>) -> WebResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.list().await?))
}

/// Get one category.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<Json<Category>> {
    Ok(Json(state.categories.get(CategoryId::new(id)).await?))
}

/// Create a category.
pub async fn create_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> WebResult<(StatusCode, Json<Category>)> {
    let category = state.categories.create(&request.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category.
pub async fn rename_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CategoryRequest>,
) -> WebResult<Json<Category>> {
    Ok(Json(
        state
            .categories
            .rename(CategoryId::new(id), &request.name)
            .await?,
    ))
}

/// Delete a category; its books move to the fallback category.
pub async fn delete_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<StatusCode> {
    state.categories.delete(CategoryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

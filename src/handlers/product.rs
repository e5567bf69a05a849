//! HTTP handlers for product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{CreateProductInput, Product, ProductService, UpdateProductInput};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.create(input).await?;
    Ok(Json(product))
}

/// Get a product by id
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.get(product_id).await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListProductsQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.list(query.include_inactive).await?;
    Ok(Json(products))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.update(product_id, input).await?;
    Ok(Json(product))
}

/// Deactivate a product
pub async fn delete_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProductService::new(state.db);
    service.deactivate(product_id).await?;
    Ok(Json(()))
}

/// Products at or below their reorder threshold
pub async fn low_stock_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.low_stock().await?;
    Ok(Json(products))
}

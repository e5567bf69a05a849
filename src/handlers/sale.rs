//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sale::{
    CreateSaleInput, ListSalesQuery, ProcessReturnInput, ReturnResult, Sale, SaleDetail,
    SaleReceipt, SaleService,
};
use crate::AppState;

fn sale_service(state: AppState) -> SaleService {
    SaleService::new(
        state.db,
        state.config.sales.cancellation_window_hours,
        state.config.sales.tax_rate_percent,
    )
}

/// Create a sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleReceipt>> {
    let service = sale_service(state);
    let receipt = service.create_sale(current_user.0.user_id, input).await?;
    Ok(Json(receipt))
}

/// Get a sale with its line items
pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleDetail>> {
    let service = sale_service(state);
    let detail = service.get_sale(sale_id).await?;
    Ok(Json(detail))
}

/// List sales, optionally filtered by date range and status
pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    let service = sale_service(state);
    let sales = service.list_sales(query).await?;
    Ok(Json(sales))
}

/// Cancel a sale and restore its stock
pub async fn cancel_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = sale_service(state);
    let sale = service.cancel_sale(current_user.0.user_id, sale_id).await?;
    Ok(Json(sale))
}

/// Process a partial return on a sale
pub async fn process_return(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<ProcessReturnInput>,
) -> AppResult<Json<ReturnResult>> {
    let service = sale_service(state);
    let result = service
        .process_return(current_user.0.user_id, sale_id, input)
        .await?;
    Ok(Json(result))
}

//! HTTP handlers for stock adjustments and the movement ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::MovementReason;
use crate::services::activity::ActivityLogService;
use crate::services::stock_ledger::{StockAdjustment, StockLedgerService, StockMovement};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub product_id: Uuid,
    pub new_stock: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplenishStockInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct ListMovementsQuery {
    pub limit: Option<i64>,
}

/// Set a product's stock to an absolute value, recording the delta
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockAdjustment>> {
    let service = StockLedgerService::new(state.db.clone());
    let adjustment = service
        .set_stock(
            input.product_id,
            input.new_stock,
            MovementReason::Adjustment,
            input.notes,
            Some(current_user.0.user_id),
        )
        .await?;

    ActivityLogService::new(state.db)
        .record(
            Some(current_user.0.user_id),
            "stock.adjusted",
            "product",
            Some(input.product_id),
            Some(format!(
                "{} -> {}",
                adjustment.previous_stock, adjustment.new_stock
            )),
        )
        .await;

    Ok(Json(adjustment))
}

/// Add delivered stock on top of the current level
pub async fn replenish_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReplenishStockInput>,
) -> AppResult<Json<StockAdjustment>> {
    if input.quantity <= 0 {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Replenishment quantity must be positive".to_string(),
            message_fr: "La quantité réapprovisionnée doit être positive".to_string(),
        });
    }

    let service = StockLedgerService::new(state.db);
    let adjustment = service
        .adjust(
            input.product_id,
            input.quantity,
            MovementReason::Replenishment,
            None,
            Some(current_user.0.user_id),
        )
        .await?;
    Ok(Json(adjustment))
}

/// Recent stock movements across all products
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListMovementsQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockLedgerService::new(state.db);
    let movements = service.list_movements(query.limit.unwrap_or(100)).await?;
    Ok(Json(movements))
}

/// Movement history for one product
pub async fn product_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockLedgerService::new(state.db);
    let movements = service.movements_for_product(product_id).await?;
    Ok(Json(movements))
}

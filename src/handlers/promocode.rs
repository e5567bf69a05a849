//! HTTP handlers for promo code endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::promocode::{
    CreatePromoCodeInput, PromoCode, PromoCodeService, PromoValidation, ValidateCodeInput,
};
use crate::AppState;

/// Create a promo code (manager only)
pub async fn create_promocode(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePromoCodeInput>,
) -> AppResult<Json<PromoCode>> {
    if !current_user.0.is_manager() {
        return Err(AppError::Forbidden {
            message: "Only managers can create promo codes".to_string(),
            message_fr: "Seuls les gérants peuvent créer des codes promo".to_string(),
        });
    }

    let service = PromoCodeService::new(state.db);
    let promo = service.create(input).await?;
    Ok(Json(promo))
}

/// Validate a code against a cart amount without redeeming it
pub async fn validate_promocode(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<ValidateCodeInput>,
) -> AppResult<Json<PromoValidation>> {
    let service = PromoCodeService::new(state.db);
    let validation = service.validate(input).await?;
    Ok(Json(validation))
}

/// List promo codes
pub async fn list_promocodes(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<PromoCode>>> {
    let service = PromoCodeService::new(state.db);
    let promos = service.list().await?;
    Ok(Json(promos))
}

/// Deactivate a promo code (manager only)
pub async fn delete_promocode(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(promo_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    if !current_user.0.is_manager() {
        return Err(AppError::Forbidden {
            message: "Only managers can deactivate promo codes".to_string(),
            message_fr: "Seuls les gérants peuvent désactiver des codes promo".to_string(),
        });
    }

    let service = PromoCodeService::new(state.db);
    service.deactivate(promo_id).await?;
    Ok(Json(()))
}

//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::auth::{
    AuthService, AuthTokens, CreateUserInput, LoginInput, RefreshInput, UserInfo,
};
use crate::AppState;

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(input).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for new tokens
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh(input).await?;
    Ok(Json(tokens))
}

/// Create a staff account (manager/admin only)
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Json<UserInfo>> {
    if !current_user.0.is_manager() {
        return Err(AppError::Forbidden {
            message: "Only managers can create accounts".to_string(),
            message_fr: "Seuls les gérants peuvent créer des comptes".to_string(),
        });
    }

    let service = AuthService::new(state.db, &state.config);
    let user = service.create_user(input).await?;
    Ok(Json(user))
}

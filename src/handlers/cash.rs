//! HTTP handlers for cash session endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::cash_session::{
    CashSession, CashSessionService, CloseSessionInput, CountSessionInput, OpenSessionInput,
};
use crate::AppState;

/// Open a cash session
pub async fn open_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OpenSessionInput>,
) -> AppResult<Json<CashSession>> {
    let service = CashSessionService::new(state.db);
    let session = service.open(current_user.0.user_id, input).await?;
    Ok(Json(session))
}

/// Close a cash session with a final count
pub async fn close_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<CloseSessionInput>,
) -> AppResult<Json<CashSession>> {
    let service = CashSessionService::new(state.db);
    let session = service
        .close(current_user.0.user_id, session_id, input)
        .await?;
    Ok(Json(session))
}

/// Record a reconciliation count without closing
pub async fn count_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<CountSessionInput>,
) -> AppResult<Json<CashSession>> {
    let service = CashSessionService::new(state.db);
    let session = service.count(session_id, input).await?;
    Ok(Json(session))
}

/// The currently open session, if any
pub async fn current_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Option<CashSession>>> {
    let service = CashSessionService::new(state.db);
    let session = service.current().await?;
    Ok(Json(session))
}

/// Get a session by id
pub async fn get_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<CashSession>> {
    let service = CashSessionService::new(state.db);
    let session = service.get(session_id).await?;
    Ok(Json(session))
}

/// List sessions, newest first
pub async fn list_sessions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<CashSession>>> {
    let service = CashSessionService::new(state.db);
    let sessions = service.list().await?;
    Ok(Json(sessions))
}

//! HTTP handler for the activity log

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::activity::{ActivityEntry, ActivityLogService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListActivityQuery {
    pub limit: Option<i64>,
}

/// Recent audit entries, newest first (manager only)
pub async fn list_activity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListActivityQuery>,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    if !current_user.0.is_manager() {
        return Err(AppError::Forbidden {
            message: "Only managers can view the activity log".to_string(),
            message_fr: "Seuls les gérants peuvent consulter le journal d'activité".to_string(),
        });
    }

    let service = ActivityLogService::new(state.db);
    let entries = service.list(query.limit.unwrap_or(100)).await?;
    Ok(Json(entries))
}

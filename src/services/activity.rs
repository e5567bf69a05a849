//! Activity log sink
//!
//! Best-effort audit trail of back-office actions. Recording never fails
//! the operation that triggered it; write errors are logged and dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Activity log service
#[derive(Clone)]
pub struct ActivityLogService {
    db: PgPool,
}

/// One audit entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogService {
    /// Create a new ActivityLogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an action, swallowing any write failure
    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        entity: &str,
        entity_id: Option<Uuid>,
        detail: Option<String>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (user_id, action, entity, entity_id, detail)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(entity)
        .bind(entity_id)
        .bind(detail)
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::warn!(action, entity, "Failed to record activity: {}", e);
        }
    }

    /// List recent entries, newest first
    pub async fn list(&self, limit: i64) -> AppResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, user_id, action, entity, entity_id, detail, created_at
            FROM activity_log
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}

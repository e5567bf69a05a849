//! Cash session service for register open/close/count bookkeeping
//!
//! At most one session is open at any time; "the current session" is a
//! query for the open row, never process-wide state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::CashSessionStatus;

/// Cash session service
#[derive(Clone)]
pub struct CashSessionService {
    db: PgPool,
}

/// One register session
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CashSession {
    pub id: Uuid,
    pub status: CashSessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_amount: Decimal,
    pub closing_amount: Option<Decimal>,
    /// Running total of cash-paid sales while the session is open
    pub accumulated_sales: Decimal,
    pub counted_amount: Option<Decimal>,
    pub variance: Option<Decimal>,
    pub opened_by: Option<Uuid>,
    pub closed_by: Option<Uuid>,
    pub notes: Option<String>,
}

/// Input for opening a session
#[derive(Debug, Deserialize)]
pub struct OpenSessionInput {
    pub opening_amount: Decimal,
}

/// Input for closing a session
#[derive(Debug, Deserialize)]
pub struct CloseSessionInput {
    pub counted_amount: Decimal,
    pub notes: Option<String>,
}

/// Input for a reconciliation count without closing
#[derive(Debug, Deserialize)]
pub struct CountSessionInput {
    pub counted_amount: Decimal,
}

/// Expected drawer content at close: opening float plus cash sales
pub fn expected_amount(opening_amount: Decimal, accumulated_sales: Decimal) -> Decimal {
    opening_amount + accumulated_sales
}

/// Variance between the counted drawer and what the ledger expects
pub fn session_variance(
    opening_amount: Decimal,
    accumulated_sales: Decimal,
    counted_amount: Decimal,
) -> Decimal {
    counted_amount - expected_amount(opening_amount, accumulated_sales)
}

impl CashSessionService {
    /// Create a new CashSessionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a new session; fails with Conflict if one is already open
    pub async fn open(&self, user_id: Uuid, input: OpenSessionInput) -> AppResult<CashSession> {
        if input.opening_amount < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "opening_amount".to_string(),
                message: "Opening amount cannot be negative".to_string(),
                message_fr: "Le fonds de caisse ne peut pas être négatif".to_string(),
            });
        }

        let already_open = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM cash_sessions WHERE status = 'open')",
        )
        .fetch_one(&self.db)
        .await?;

        if already_open {
            return Err(AppError::Conflict {
                resource: "cash_session".to_string(),
                message: "A cash session is already open".to_string(),
                message_fr: "Une session de caisse est déjà ouverte".to_string(),
            });
        }

        let session = sqlx::query_as::<_, CashSession>(
            r#"
            INSERT INTO cash_sessions (status, opening_amount, opened_by)
            VALUES ('open', $1, $2)
            RETURNING id, status, opened_at, closed_at, opening_amount, closing_amount,
                      accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            "#,
        )
        .bind(input.opening_amount)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(session)
    }

    /// Add a cash sale total to the currently open session.
    ///
    /// Returns Ok(None) when no session is open: sales are the primary
    /// business event and must not fail on register bookkeeping, so the
    /// caller logs the miss instead of surfacing it.
    pub async fn add_sales_amount(&self, amount: Decimal) -> AppResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            UPDATE cash_sessions
            SET accumulated_sales = accumulated_sales + $1
            WHERE status = 'open'
            RETURNING id, status, opened_at, closed_at, opening_amount, closing_amount,
                      accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            "#,
        )
        .bind(amount)
        .fetch_optional(&self.db)
        .await?;

        if session.is_none() {
            tracing::warn!(%amount, "No open cash session, sale amount not booked");
        }

        Ok(session)
    }

    /// Close a session and record the counted variance
    pub async fn close(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        input: CloseSessionInput,
    ) -> AppResult<CashSession> {
        let current = self.get(session_id).await?;

        if current.status == CashSessionStatus::Closed {
            return Err(AppError::Conflict {
                resource: "cash_session".to_string(),
                message: "Session is already closed".to_string(),
                message_fr: "La session est déjà clôturée".to_string(),
            });
        }

        let variance = session_variance(
            current.opening_amount,
            current.accumulated_sales,
            input.counted_amount,
        );

        let session = sqlx::query_as::<_, CashSession>(
            r#"
            UPDATE cash_sessions
            SET status = 'closed', closed_at = NOW(), closing_amount = $2,
                counted_amount = $2, variance = $3, closed_by = $4, notes = $5
            WHERE id = $1 AND status = 'open'
            RETURNING id, status, opened_at, closed_at, opening_amount, closing_amount,
                      accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            "#,
        )
        .bind(session_id)
        .bind(input.counted_amount)
        .bind(variance)
        .bind(user_id)
        .bind(&input.notes)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cash session".to_string()))?;

        Ok(session)
    }

    /// Record a reconciliation count without closing the session
    pub async fn count(&self, session_id: Uuid, input: CountSessionInput) -> AppResult<CashSession> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            UPDATE cash_sessions
            SET counted_amount = $2
            WHERE id = $1 AND status = 'open'
            RETURNING id, status, opened_at, closed_at, opening_amount, closing_amount,
                      accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            "#,
        )
        .bind(session_id)
        .bind(input.counted_amount)
        .fetch_optional(&self.db)
        .await?;

        match session {
            Some(session) => Ok(session),
            None => {
                // Distinguish "unknown" from "not open"
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM cash_sessions WHERE id = $1)",
                )
                .bind(session_id)
                .fetch_one(&self.db)
                .await?;

                if exists {
                    Err(AppError::Conflict {
                        resource: "cash_session".to_string(),
                        message: "Session is not open".to_string(),
                        message_fr: "La session n'est pas ouverte".to_string(),
                    })
                } else {
                    Err(AppError::NotFound("Cash session".to_string()))
                }
            }
        }
    }

    /// Get the currently open session, if any
    pub async fn current(&self) -> AppResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            SELECT id, status, opened_at, closed_at, opening_amount, closing_amount,
                   accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            FROM cash_sessions
            WHERE status = 'open'
            ORDER BY opened_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(session)
    }

    /// Get a session by id
    pub async fn get(&self, session_id: Uuid) -> AppResult<CashSession> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            SELECT id, status, opened_at, closed_at, opening_amount, closing_amount,
                   accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            FROM cash_sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cash session".to_string()))?;

        Ok(session)
    }

    /// List sessions, most recent first
    pub async fn list(&self) -> AppResult<Vec<CashSession>> {
        let sessions = sqlx::query_as::<_, CashSession>(
            r#"
            SELECT id, status, opened_at, closed_at, opening_amount, closing_amount,
                   accumulated_sales, counted_amount, variance, opened_by, closed_by, notes
            FROM cash_sessions
            ORDER BY opened_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn variance_is_counted_minus_expected() {
        // Opened with 100, sold 250 cash, drawer counted at 345
        assert_eq!(
            session_variance(dec("100"), dec("250"), dec("345")),
            dec("-5")
        );
    }

    #[test]
    fn variance_zero_when_drawer_matches() {
        assert_eq!(
            session_variance(dec("100"), dec("250"), dec("350")),
            Decimal::ZERO
        );
    }
}

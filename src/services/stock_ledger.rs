//! Stock ledger service: the single write path for product stock
//!
//! Every change to `products.stock` goes through here and leaves one
//! append-only row in `stock_movements`. The stock column is the
//! materialized running sum of the ledger.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::MovementReason;

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedgerService {
    db: PgPool,
}

/// Immutable ledger entry for one stock change
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity_delta: i32,
    pub reason: MovementReason,
    pub source_ref_id: Option<Uuid>,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a ledger adjustment
#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub previous_stock: i32,
    pub new_stock: i32,
    /// False when the adjustment was deduplicated by its source reference
    pub applied: bool,
}

impl StockLedgerService {
    /// Create a new StockLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply a delta to a product's stock in its own transaction.
    ///
    /// Sale-driven decrements fail with `InsufficientStock` rather than
    /// driving stock below zero.
    pub async fn adjust(
        &self,
        product_id: Uuid,
        delta: i32,
        reason: MovementReason,
        source_ref_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> AppResult<StockAdjustment> {
        let mut tx = self.db.begin().await?;
        let adjustment =
            Self::apply(&mut *tx, product_id, delta, reason, source_ref_id, None, created_by)
                .await?;
        tx.commit().await?;
        Ok(adjustment)
    }

    /// Apply a delta inside a caller-supplied transaction.
    ///
    /// The product row is locked with FOR UPDATE so two concurrent sales
    /// cannot both read the same stock value. Movements whose reason carries
    /// a source reference are idempotent: re-applying the same
    /// (product, reason, source) is a no-op returning the current stock.
    pub async fn apply(
        conn: &mut PgConnection,
        product_id: Uuid,
        delta: i32,
        reason: MovementReason,
        source_ref_id: Option<Uuid>,
        notes: Option<String>,
        created_by: Option<Uuid>,
    ) -> AppResult<StockAdjustment> {
        // Retry dedup before touching the row
        if reason.dedupes_by_source() {
            if let Some(source) = source_ref_id {
                let already_applied = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM stock_movements
                     WHERE product_id = $1 AND reason = $2 AND source_ref_id = $3)",
                )
                .bind(product_id)
                .bind(reason)
                .bind(source)
                .fetch_one(&mut *conn)
                .await?;

                if already_applied {
                    let current = Self::lock_stock(conn, product_id).await?;
                    tracing::debug!(
                        %product_id, reason = reason.as_str(), %source,
                        "Skipping duplicate stock movement"
                    );
                    return Ok(StockAdjustment {
                        product_id,
                        previous_stock: current,
                        new_stock: current,
                        applied: false,
                    });
                }
            }
        }

        let previous_stock = Self::lock_stock(conn, product_id).await?;
        let new_stock = previous_stock + delta;

        if new_stock < 0 {
            return Err(AppError::InsufficientStock(format!(
                "product {} has {} in stock, requested {}",
                product_id, previous_stock, -delta
            )));
        }

        Self::write_movement(
            conn,
            product_id,
            delta,
            reason,
            source_ref_id,
            previous_stock,
            new_stock,
            notes,
            created_by,
        )
        .await?;

        Ok(StockAdjustment {
            product_id,
            previous_stock,
            new_stock,
            applied: true,
        })
    }

    /// Set a product's stock to an absolute value (bulk adjustment flow).
    ///
    /// Reconciled with the ledger model: the delta against the locked
    /// current stock is recorded as one movement. Requested values below
    /// zero clamp to zero.
    pub async fn set_stock(
        &self,
        product_id: Uuid,
        new_stock: i32,
        reason: MovementReason,
        notes: Option<String>,
        created_by: Option<Uuid>,
    ) -> AppResult<StockAdjustment> {
        let target = new_stock.max(0);

        let mut tx = self.db.begin().await?;

        let previous_stock = Self::lock_stock(&mut *tx, product_id).await?;
        let delta = target - previous_stock;

        if delta == 0 {
            tx.commit().await?;
            return Ok(StockAdjustment {
                product_id,
                previous_stock,
                new_stock: previous_stock,
                applied: false,
            });
        }

        Self::write_movement(
            &mut *tx,
            product_id,
            delta,
            reason,
            None,
            previous_stock,
            target,
            notes,
            created_by,
        )
        .await?;

        tx.commit().await?;

        Ok(StockAdjustment {
            product_id,
            previous_stock,
            new_stock: target,
            applied: true,
        })
    }

    /// List recent movements across all products
    pub async fn list_movements(&self, limit: i64) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, quantity_delta, reason, source_ref_id,
                   previous_stock, new_stock, notes, created_by, created_at
            FROM stock_movements
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// List movements for one product
    pub async fn movements_for_product(&self, product_id: Uuid) -> AppResult<Vec<StockMovement>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, quantity_delta, reason, source_ref_id,
                   previous_stock, new_stock, notes, created_by, created_at
            FROM stock_movements
            WHERE product_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Lock the product row and return its current stock
    async fn lock_stock(conn: &mut PgConnection, product_id: Uuid) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Update the materialized stock and append the ledger row
    #[allow(clippy::too_many_arguments)]
    async fn write_movement(
        conn: &mut PgConnection,
        product_id: Uuid,
        delta: i32,
        reason: MovementReason,
        source_ref_id: Option<Uuid>,
        previous_stock: i32,
        new_stock: i32,
        notes: Option<String>,
        created_by: Option<Uuid>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE products SET stock = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_stock)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_movements (product_id, quantity_delta, reason, source_ref_id,
                                         previous_stock, new_stock, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(reason)
        .bind(source_ref_id)
        .bind(previous_stock)
        .bind(new_stock)
        .bind(notes)
        .bind(created_by)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

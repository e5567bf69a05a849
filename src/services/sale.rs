//! Sale transaction orchestrator
//!
//! Creates a sale with its line items and stock decrements inside one
//! database transaction; cash-session bookkeeping and promo redemption run
//! after commit as best-effort side effects. Cancellation and returns
//! compensate through the same stock ledger.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{MovementReason, PaymentMethod, SaleStatus};
use crate::services::activity::ActivityLogService;
use crate::services::cash_session::CashSessionService;
use crate::services::promocode::{self, PromoCodeService};
use crate::services::stock_ledger::StockLedgerService;

/// Sale orchestration service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    cancellation_window_hours: i64,
    tax_rate_percent: Decimal,
}

/// Sale record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub promo_code: Option<String>,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// One line of a sale; quantity_sold is immutable once the sale completes
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: i32,
    pub returned_quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
}

/// Input line for creating a sale
#[derive(Debug, Deserialize)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub discount: Option<Decimal>,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub items: Vec<SaleItemInput>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub promo_code: Option<String>,
    pub notes: Option<String>,
}

/// Input line for a return
#[derive(Debug, Deserialize)]
pub struct ReturnItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for processing a return
#[derive(Debug, Deserialize)]
pub struct ProcessReturnInput {
    pub items: Vec<ReturnItemInput>,
    pub reason: Option<String>,
}

/// Outcome of the best-effort cash-session side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookkeepingStatus {
    /// Amount added to the open cash session
    Applied,
    /// Payment method does not feed the register
    NotApplicable,
    /// No session was open; sale succeeded anyway
    NoOpenSession,
    /// Bookkeeping write failed; sale succeeded anyway
    Failed,
}

/// A created or fetched sale with its lines
#[derive(Debug, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Response for sale creation, carrying the auxiliary-effect outcome
#[derive(Debug, Serialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub bookkeeping: BookkeepingStatus,
}

/// Result of a return operation
#[derive(Debug, Serialize)]
pub struct ReturnResult {
    pub return_id: Uuid,
    pub sale_id: Uuid,
    pub status: SaleStatus,
    pub restocked: Vec<RestockedItem>,
}

/// Stock restored for one returned line
#[derive(Debug, Serialize)]
pub struct RestockedItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub new_stock: i32,
}

/// Query filters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct ListSalesQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<SaleStatus>,
}

/// Whether a sale is still inside the cancellation window
pub fn within_cancellation_window(
    sale_time: DateTime<Utc>,
    now: DateTime<Utc>,
    window_hours: i64,
) -> bool {
    now - sale_time <= Duration::hours(window_hours)
}

/// Line total for a quantity at a unit price, minus a per-line discount
pub fn line_total(unit_price: Decimal, quantity: i32, discount: Decimal) -> Decimal {
    unit_price * Decimal::from(quantity) - discount
}

const SALE_BY_ID_SQL: &str = r#"
            SELECT id, customer_name, payment_method, total_amount, tax_amount,
                   discount_amount, final_amount, promo_code, status, notes,
                   created_by, created_at, cancelled_at
            FROM sales
            WHERE id = $1
            "#;

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool, cancellation_window_hours: i64, tax_rate_percent: f64) -> Self {
        Self {
            db,
            cancellation_window_hours,
            tax_rate_percent: Decimal::try_from(tax_rate_percent).unwrap_or(Decimal::ZERO),
        }
    }

    /// Create a sale: validate, persist sale + items + stock decrements
    /// atomically, then run the best-effort side effects.
    pub async fn create_sale(
        &self,
        user_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<SaleReceipt> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A sale requires at least one item".to_string(),
                message_fr: "Une vente nécessite au moins un article".to_string(),
            });
        }

        // One line per product: the ledger keys sale movements by
        // (product, sale), so a duplicated line must be merged by the client.
        let mut seen_products = std::collections::HashSet::new();
        for item in &input.items {
            if !seen_products.insert(item.product_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: "Duplicate product lines must be merged".to_string(),
                    message_fr: "Les lignes de produit en double doivent être fusionnées"
                        .to_string(),
                });
            }
            if item.quantity <= 0 {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Quantities must be positive".to_string(),
                    message_fr: "Les quantités doivent être positives".to_string(),
                });
            }
            if item.discount.unwrap_or(Decimal::ZERO) < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "discount".to_string(),
                    message: "Line discount cannot be negative".to_string(),
                    message_fr: "La remise par ligne ne peut pas être négative".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        // Resolve products and price the lines
        let mut lines: Vec<(Uuid, String, i32, Decimal, Decimal, Decimal)> = Vec::new();
        let mut total_amount = Decimal::ZERO;

        for item in &input.items {
            let row = sqlx::query_as::<_, (String, Decimal, bool)>(
                "SELECT name, price, is_active FROM products WHERE id = $1",
            )
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            let (name, price, is_active) = row;
            if !is_active {
                return Err(AppError::Validation {
                    field: "product_id".to_string(),
                    message: format!("Product {} is no longer sold", name),
                    message_fr: format!("Le produit {} n'est plus en vente", name),
                });
            }

            let discount = item.discount.unwrap_or(Decimal::ZERO);
            let total = line_total(price, item.quantity, discount);
            if total < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "discount".to_string(),
                    message: "Line discount exceeds line price".to_string(),
                    message_fr: "La remise dépasse le prix de la ligne".to_string(),
                });
            }

            total_amount += total;
            lines.push((item.product_id, name, item.quantity, price, discount, total));
        }

        // Promo discount over the order total
        let (promo_validation, promo_id) = match &input.promo_code {
            Some(code) => {
                let promo_service = PromoCodeService::new(self.db.clone());
                let promo = promo_service.find_by_code(code).await?;
                let validation = promocode::evaluate_code(&promo, total_amount, Utc::now())?;
                (Some(validation), Some(promo.id))
            }
            None => (None, None),
        };

        let discount_amount = promo_validation
            .as_ref()
            .map(|v| v.discount_amount)
            .unwrap_or(Decimal::ZERO);
        let taxable = (total_amount - discount_amount).max(Decimal::ZERO);
        let tax_amount = taxable * self.tax_rate_percent / Decimal::from(100);
        let final_amount = taxable + tax_amount;

        // Persist sale + items
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (customer_name, payment_method, total_amount, tax_amount,
                               discount_amount, final_amount, promo_code, status, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'completed', $8, $9)
            RETURNING id, customer_name, payment_method, total_amount, tax_amount,
                      discount_amount, final_amount, promo_code, status, notes,
                      created_by, created_at, cancelled_at
            "#,
        )
        .bind(&input.customer_name)
        .bind(input.payment_method)
        .bind(total_amount)
        .bind(tax_amount)
        .bind(discount_amount)
        .bind(final_amount)
        .bind(promo_validation.as_ref().map(|v| v.code.clone()))
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, name, quantity, price, discount, total) in &lines {
            let item = sqlx::query_as::<_, SaleItem>(
                r#"
                INSERT INTO sale_items (sale_id, product_id, product_name, quantity_sold,
                                        unit_price, discount, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, sale_id, product_id, product_name, quantity_sold,
                          returned_quantity, unit_price, discount, line_total
                "#,
            )
            .bind(sale.id)
            .bind(product_id)
            .bind(name)
            .bind(quantity)
            .bind(price)
            .bind(discount)
            .bind(total)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        // Decrement stock per line inside the same transaction. An
        // InsufficientStock here rolls the whole sale back.
        for (product_id, _, quantity, ..) in &lines {
            StockLedgerService::apply(
                &mut *tx,
                *product_id,
                -quantity,
                MovementReason::Sale,
                Some(sale.id),
                None,
                Some(user_id),
            )
            .await?;
        }

        tx.commit().await?;

        // Best-effort side effects, after the sale is durable
        let bookkeeping = if input.payment_method.is_cash_equivalent() {
            let cash_service = CashSessionService::new(self.db.clone());
            match cash_service.add_sales_amount(final_amount).await {
                Ok(Some(_)) => BookkeepingStatus::Applied,
                Ok(None) => BookkeepingStatus::NoOpenSession,
                Err(e) => {
                    tracing::warn!(sale_id = %sale.id, "Cash session update failed: {}", e);
                    BookkeepingStatus::Failed
                }
            }
        } else {
            BookkeepingStatus::NotApplicable
        };

        if let Some(promo_id) = promo_id {
            let promo_service = PromoCodeService::new(self.db.clone());
            if let Err(e) = promo_service.redeem(promo_id).await {
                tracing::warn!(sale_id = %sale.id, "Promo redemption failed: {}", e);
            }
        }

        ActivityLogService::new(self.db.clone())
            .record(
                Some(user_id),
                "sale.created",
                "sale",
                Some(sale.id),
                Some(format!("{} items, total {}", items.len(), final_amount)),
            )
            .await;

        Ok(SaleReceipt {
            sale,
            items,
            bookkeeping,
        })
    }

    /// Cancel a sale within the cancellation window, restoring stock
    pub async fn cancel_sale(&self, user_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let detail = self.get_sale(sale_id).await?;

        if detail.sale.status == SaleStatus::Cancelled {
            return Err(AppError::Conflict {
                resource: "sale".to_string(),
                message: "Sale is already cancelled".to_string(),
                message_fr: "La vente est déjà annulée".to_string(),
            });
        }

        if !within_cancellation_window(
            detail.sale.created_at,
            Utc::now(),
            self.cancellation_window_hours,
        ) {
            return Err(AppError::Forbidden {
                message: format!(
                    "Cannot cancel a sale after {} hours",
                    self.cancellation_window_hours
                ),
                message_fr: format!(
                    "Impossible d'annuler une vente après {} heures",
                    self.cancellation_window_hours
                ),
            });
        }

        let mut tx = self.db.begin().await?;

        // Restore what is still out: quantities already returned have
        // their own compensating movements.
        for item in &detail.items {
            let outstanding = item.quantity_sold - item.returned_quantity;
            if outstanding > 0 {
                StockLedgerService::apply(
                    &mut *tx,
                    item.product_id,
                    outstanding,
                    MovementReason::Cancellation,
                    Some(sale_id),
                    None,
                    Some(user_id),
                )
                .await?;
            }
        }

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET status = 'cancelled', cancelled_at = NOW()
            WHERE id = $1
            RETURNING id, customer_name, payment_method, total_amount, tax_amount,
                      discount_amount, final_amount, promo_code, status, notes,
                      created_by, created_at, cancelled_at
            "#,
        )
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        ActivityLogService::new(self.db.clone())
            .record(Some(user_id), "sale.cancelled", "sale", Some(sale_id), None)
            .await;

        Ok(sale)
    }

    /// Process a partial return: restore stock for the returned quantities
    /// and track per-line running returned totals.
    pub async fn process_return(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        input: ProcessReturnInput,
    ) -> AppResult<ReturnResult> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A return requires at least one item".to_string(),
                message_fr: "Un retour nécessite au moins un article".to_string(),
            });
        }

        let detail = self.get_sale(sale_id).await?;

        if detail.sale.status == SaleStatus::Cancelled {
            return Err(AppError::Conflict {
                resource: "sale".to_string(),
                message: "Cannot return items from a cancelled sale".to_string(),
                message_fr: "Impossible de retourner des articles d'une vente annulée".to_string(),
            });
        }

        // Validate every requested line against the running returned totals
        let mut seen_products = std::collections::HashSet::new();
        for requested in &input.items {
            if !seen_products.insert(requested.product_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: "Duplicate product lines must be merged".to_string(),
                    message_fr: "Les lignes de produit en double doivent être fusionnées"
                        .to_string(),
                });
            }
            if requested.quantity <= 0 {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Return quantities must be positive".to_string(),
                    message_fr: "Les quantités retournées doivent être positives".to_string(),
                });
            }

            let line = detail
                .items
                .iter()
                .find(|i| i.product_id == requested.product_id)
                .ok_or_else(|| AppError::Validation {
                    field: "product_id".to_string(),
                    message: "Product is not part of this sale".to_string(),
                    message_fr: "Le produit ne fait pas partie de cette vente".to_string(),
                })?;

            if line.returned_quantity + requested.quantity > line.quantity_sold {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: format!(
                        "Return of {} exceeds remaining quantity {} for product {}",
                        requested.quantity,
                        line.quantity_sold - line.returned_quantity,
                        line.product_name
                    ),
                    message_fr: format!(
                        "Le retour de {} dépasse la quantité restante pour {}",
                        requested.quantity, line.product_name
                    ),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        // Each return gets its own record so repeated returns against one
        // sale stay distinguishable in the ledger.
        let return_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO sale_returns (sale_id, reason, created_by)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(sale_id)
        .bind(&input.reason)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut restocked = Vec::with_capacity(input.items.len());
        for requested in &input.items {
            let adjustment = StockLedgerService::apply(
                &mut *tx,
                requested.product_id,
                requested.quantity,
                MovementReason::Return,
                Some(return_id),
                input.reason.clone(),
                Some(user_id),
            )
            .await?;

            sqlx::query(
                r#"
                UPDATE sale_items
                SET returned_quantity = returned_quantity + $3
                WHERE sale_id = $1 AND product_id = $2
                "#,
            )
            .bind(sale_id)
            .bind(requested.product_id)
            .bind(requested.quantity)
            .execute(&mut *tx)
            .await?;

            restocked.push(RestockedItem {
                product_id: requested.product_id,
                quantity: requested.quantity,
                new_stock: adjustment.new_stock,
            });
        }

        // Any accepted return moves the sale to partially_returned
        let status: SaleStatus = sqlx::query_scalar::<_, SaleStatus>(
            r#"
            UPDATE sales
            SET status = 'partially_returned'
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        ActivityLogService::new(self.db.clone())
            .record(
                Some(user_id),
                "sale.returned",
                "sale",
                Some(sale_id),
                input.reason.clone(),
            )
            .await;

        Ok(ReturnResult {
            return_id,
            sale_id,
            status,
            restocked,
        })
    }

    /// Get a sale with its items
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleDetail> {
        let sale = sqlx::query_as::<_, Sale>(SALE_BY_ID_SQL)
            .bind(sale_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, quantity_sold,
                   returned_quantity, unit_price, discount, line_total
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleDetail { sale, items })
    }

    /// List sales with optional date window and status filters
    pub async fn list_sales(&self, query: ListSalesQuery) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_name, payment_method, total_amount, tax_amount,
                   discount_amount, final_amount, promo_code, status, notes,
                   created_by, created_at, cancelled_at
            FROM sales
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
              AND ($3::sale_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.from)
        .bind(query.to)
        .bind(query.status)
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_window_boundaries() {
        let now = Utc::now();
        assert!(within_cancellation_window(now - Duration::hours(1), now, 24));
        assert!(!within_cancellation_window(now - Duration::hours(25), now, 24));
    }

    #[test]
    fn line_total_subtracts_discount() {
        let total = line_total(Decimal::from(10), 3, Decimal::from(5));
        assert_eq!(total, Decimal::from(25));
    }
}

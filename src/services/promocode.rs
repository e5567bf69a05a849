//! Promo code service: CRUD plus discount evaluation
//!
//! Evaluation distinguishes an unknown code from an expired one, so the
//! cashier sees two different messages.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::PromoType;

/// Promo code service
#[derive(Clone)]
pub struct PromoCodeService {
    db: PgPool,
}

/// Promo code record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub promo_type: PromoType,
    pub value: Decimal,
    pub min_amount: Decimal,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a promo code
#[derive(Debug, Deserialize)]
pub struct CreatePromoCodeInput {
    pub code: String,
    pub promo_type: PromoType,
    pub value: Decimal,
    pub min_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input for validating a code against an order amount
#[derive(Debug, Deserialize)]
pub struct ValidateCodeInput {
    pub code: String,
    pub amount: Decimal,
}

/// Result of a successful validation
#[derive(Debug, Clone, Serialize)]
pub struct PromoValidation {
    pub code: String,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Normalize a code the way it is stored: trimmed, uppercase
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Compute the discount a promo grants on an order amount
pub fn compute_discount(promo_type: PromoType, value: Decimal, amount: Decimal) -> Decimal {
    match promo_type {
        PromoType::Percentage => amount * value / Decimal::from(100),
        PromoType::Fixed => value,
    }
}

/// Evaluate a fetched promo row against an order amount at a point in time.
///
/// Pure decision logic so the ordering of failure modes is testable:
/// expiry, then minimum amount, then usage cap.
pub fn evaluate_code(
    promo: &PromoCode,
    amount: Decimal,
    now: DateTime<Utc>,
) -> AppResult<PromoValidation> {
    if let Some(expires_at) = promo.expires_at {
        if expires_at < now {
            return Err(AppError::PromoExpired);
        }
    }

    if amount < promo.min_amount {
        return Err(AppError::PromoBelowMinimum {
            min_amount: promo.min_amount,
        });
    }

    if let Some(max_uses) = promo.max_uses {
        if promo.used_count >= max_uses {
            return Err(AppError::PromoUsageLimit);
        }
    }

    let discount_amount = compute_discount(promo.promo_type, promo.value, amount);
    // A fixed discount larger than the order must not produce a negative total
    let final_amount = (amount - discount_amount).max(Decimal::ZERO);

    Ok(PromoValidation {
        code: promo.code.clone(),
        discount_amount,
        final_amount,
    })
}

impl PromoCodeService {
    /// Create a new PromoCodeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate a code against an order amount
    pub async fn validate(&self, input: ValidateCodeInput) -> AppResult<PromoValidation> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Amount must be positive".to_string(),
                message_fr: "Le montant doit être positif".to_string(),
            });
        }

        let promo = self.find_by_code(&input.code).await?;
        evaluate_code(&promo, input.amount, Utc::now())
    }

    /// Fetch a code regardless of expiry; absence is "Code promo invalide"
    pub async fn find_by_code(&self, code: &str) -> AppResult<PromoCode> {
        let normalized = normalize_code(code);

        let promo = sqlx::query_as::<_, PromoCode>(
            r#"
            SELECT id, code, promo_type, value, min_amount, max_uses, used_count,
                   expires_at, is_active, created_at
            FROM promo_codes
            WHERE code = $1 AND is_active = true
            "#,
        )
        .bind(&normalized)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Promo code".to_string()))?;

        Ok(promo)
    }

    /// Create a new promo code
    pub async fn create(&self, input: CreatePromoCodeInput) -> AppResult<PromoCode> {
        let code = normalize_code(&input.code);

        if code.is_empty() {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: "Code cannot be empty".to_string(),
                message_fr: "Le code ne peut pas être vide".to_string(),
            });
        }

        if input.value <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "value".to_string(),
                message: "Value must be positive".to_string(),
                message_fr: "La valeur doit être positive".to_string(),
            });
        }

        if input.promo_type == PromoType::Percentage && input.value > Decimal::from(100) {
            return Err(AppError::Validation {
                field: "value".to_string(),
                message: "Percentage discount cannot exceed 100".to_string(),
                message_fr: "La remise en pourcentage ne peut pas dépasser 100".to_string(),
            });
        }

        if let Some(max_uses) = input.max_uses {
            if max_uses <= 0 {
                return Err(AppError::Validation {
                    field: "max_uses".to_string(),
                    message: "Maximum uses must be positive".to_string(),
                    message_fr: "Le nombre maximal d'utilisations doit être positif".to_string(),
                });
            }
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM promo_codes WHERE code = $1)",
        )
        .bind(&code)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let min_amount = input.min_amount.unwrap_or(Decimal::ZERO);

        let promo = sqlx::query_as::<_, PromoCode>(
            r#"
            INSERT INTO promo_codes (code, promo_type, value, min_amount, max_uses, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, code, promo_type, value, min_amount, max_uses, used_count,
                      expires_at, is_active, created_at
            "#,
        )
        .bind(&code)
        .bind(input.promo_type)
        .bind(input.value)
        .bind(min_amount)
        .bind(input.max_uses)
        .bind(input.expires_at)
        .fetch_one(&self.db)
        .await?;

        Ok(promo)
    }

    /// List all promo codes
    pub async fn list(&self) -> AppResult<Vec<PromoCode>> {
        let promos = sqlx::query_as::<_, PromoCode>(
            r#"
            SELECT id, code, promo_type, value, min_amount, max_uses, used_count,
                   expires_at, is_active, created_at
            FROM promo_codes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(promos)
    }

    /// Deactivate a promo code (codes referenced by past sales are kept)
    pub async fn deactivate(&self, promo_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE promo_codes SET is_active = false WHERE id = $1")
            .bind(promo_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Promo code".to_string()));
        }

        Ok(())
    }

    /// Count one redemption; bounded by max_uses when set
    pub async fn redeem(&self, promo_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE promo_codes
            SET used_count = used_count + 1
            WHERE id = $1 AND (max_uses IS NULL OR used_count < max_uses)
            "#,
        )
        .bind(promo_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PromoUsageLimit);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_normalize_to_trimmed_uppercase() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
        assert_eq!(normalize_code("ÉTÉ2024"), "ÉTÉ2024");
    }

    #[test]
    fn percentage_discount_scales_with_amount() {
        let d = compute_discount(PromoType::Percentage, Decimal::from(10), Decimal::from(2000));
        assert_eq!(d, Decimal::from(200));
    }

    #[test]
    fn fixed_discount_is_flat() {
        let d = compute_discount(PromoType::Fixed, Decimal::from(50), Decimal::from(2000));
        assert_eq!(d, Decimal::from(50));
    }
}

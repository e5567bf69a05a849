//! Shared domain enums for the Retail POS Back Office
//!
//! Row structs live next to the service that owns them; the enums here are
//! shared across services and map onto Postgres enum types.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sale_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Cancelled,
    PartiallyReturned,
}

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobilePayment,
    Check,
}

impl PaymentMethod {
    /// Cash-equivalent methods feed the open register session
    pub fn is_cash_equivalent(&self) -> bool {
        matches!(self, PaymentMethod::Cash | PaymentMethod::Check)
    }
}

/// Status of a register cash session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cash_session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashSessionStatus {
    Open,
    Closed,
}

/// Kind of discount a promo code grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "promo_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PromoType {
    Percentage,
    Fixed,
}

/// Reason attached to every stock ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Sale,
    Cancellation,
    Return,
    Adjustment,
    Replenishment,
    Manual,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::Sale => "sale",
            MovementReason::Cancellation => "cancellation",
            MovementReason::Return => "return",
            MovementReason::Adjustment => "adjustment",
            MovementReason::Replenishment => "replenishment",
            MovementReason::Manual => "manual",
        }
    }

    /// Movements driven by a referenced business event are deduplicated by
    /// their source reference so a retried request cannot apply twice.
    pub fn dedupes_by_source(&self) -> bool {
        matches!(
            self,
            MovementReason::Sale | MovementReason::Cancellation | MovementReason::Return
        )
    }
}

//! Error handling for the Retail POS Back Office
//!
//! Provides consistent error responses in English and French

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_fr: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        message_fr: String,
    },

    // Business logic errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Promo code expired")]
    PromoExpired,

    #[error("Order amount below promo minimum of {min_amount}")]
    PromoBelowMinimum { min_amount: Decimal },

    #[error("Promo code usage limit reached")]
    PromoUsageLimit,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<Decimal>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: String, message_fr: String) -> Self {
        Self {
            code: code.to_string(),
            message_en,
            message_fr,
            field: None,
            min_amount: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_CREDENTIALS",
                    "Invalid email or password".to_string(),
                    "E-mail ou mot de passe incorrect".to_string(),
                ),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "TOKEN_EXPIRED",
                    "Token has expired".to_string(),
                    "Le jeton a expiré".to_string(),
                ),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_TOKEN",
                    "Invalid token".to_string(),
                    "Jeton invalide".to_string(),
                ),
            ),
            AppError::Validation {
                field,
                message,
                message_fr,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_fr.clone())
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new(
                        "DUPLICATE_ENTRY",
                        format!("A record with this {} already exists", field),
                        format!("Un enregistrement avec ce {} existe déjà", field),
                    )
                },
            ),
            AppError::Conflict {
                resource,
                message,
                message_fr,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(resource.clone()),
                    ..ErrorDetail::new("CONFLICT", message.clone(), message_fr.clone())
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("{} introuvable", resource),
                ),
            ),
            AppError::Forbidden {
                message,
                message_fr,
            } => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("FORBIDDEN", message.clone(), message_fr.clone()),
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    msg.clone(),
                    format!("Stock insuffisant : {}", msg),
                ),
            ),
            AppError::PromoExpired => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "PROMO_EXPIRED",
                    "Promo code has expired".to_string(),
                    "Code promo expiré".to_string(),
                ),
            ),
            AppError::PromoBelowMinimum { min_amount } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    min_amount: Some(*min_amount),
                    ..ErrorDetail::new(
                        "PROMO_BELOW_MINIMUM",
                        format!("Order amount is below the promo minimum of {}", min_amount),
                        format!("Montant minimum de {} requis pour ce code promo", min_amount),
                    )
                },
            ),
            AppError::PromoUsageLimit => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "PROMO_USAGE_LIMIT",
                    "Promo code usage limit reached".to_string(),
                    "Limite d'utilisation du code promo atteinte".to_string(),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    "Une erreur de base de données est survenue".to_string(),
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    msg.clone(),
                    "Erreur interne du serveur".to_string(),
                ),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    "Erreur interne du serveur".to_string(),
                ),
            ),
        };

        // Log the error for debugging; the client only sees the generic detail
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

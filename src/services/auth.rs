//! Authentication service for login and token management
//!
//! The back office only needs a thin user/session resolver: staff accounts
//! are seeded by an admin, sign in with email + password, and carry a role
//! claim used for attribution of sales and cash actions.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for refreshing an access token
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Input for creating a staff account
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

/// Staff account as returned to clients
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Authenticate by email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(input.email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.issue_tokens(user.id, &user.role)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let claims = self.decode_token(&input.refresh_token)?;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        // Re-check the account is still active before re-issuing
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, is_active
            FROM users
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

        self.issue_tokens(user.id, &user.role)
    }

    /// Create a staff account (manager only, enforced at the handler)
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<UserInfo> {
        let email = input.email.trim().to_lowercase();

        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: "A valid email is required".to_string(),
                message_fr: "Une adresse e-mail valide est requise".to_string(),
            });
        }

        if input.password.len() < 8 {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: "Password must be at least 8 characters".to_string(),
                message_fr: "Le mot de passe doit contenir au moins 8 caractères".to_string(),
            });
        }

        let valid_roles = ["admin", "manager", "cashier"];
        if !valid_roles.contains(&input.role.as_str()) {
            return Err(AppError::Validation {
                field: "role".to_string(),
                message: "Invalid role".to_string(),
                message_fr: "Rôle invalide".to_string(),
            });
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(&email)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, UserInfo>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, is_active
            "#,
        )
        .bind(input.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(&input.role)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    fn issue_tokens(&self, user_id: Uuid, role: &str) -> AppResult<AuthTokens> {
        let access_token = self.encode_token(user_id, role, self.access_token_expiry)?;
        let refresh_token = self.encode_token(user_id, role, self.refresh_token_expiry)?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn encode_token(&self, user_id: Uuid, role: &str, expiry_secs: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    fn decode_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }
}

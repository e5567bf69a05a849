//! Product catalog service
//!
//! CRUD for products. The stock column is read here but never written:
//! all stock changes go through the stock ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub stock: i32,
    pub min_stock: i32,
    pub cost_price: Decimal,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub min_stock: Option<i32>,
    pub cost_price: Decimal,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

/// Input for updating a product.
///
/// Deliberately has no stock field; stock is ledger-mediated only.
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub min_stock: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product; SKU must be unique
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
                message_fr: "Le nom ne peut pas être vide".to_string(),
            });
        }

        if input.price < Decimal::ZERO || input.cost_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: "Prices cannot be negative".to_string(),
                message_fr: "Les prix ne peuvent pas être négatifs".to_string(),
            });
        }

        let sku_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)",
        )
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;

        if sku_taken {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, sku, barcode, min_stock, cost_price, price,
                                  category_id, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, sku, barcode, stock, min_stock, cost_price, price,
                      category_id, supplier_id, is_active, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(input.min_stock.unwrap_or(0))
        .bind(input.cost_price)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, sku, barcode, stock, min_stock, cost_price, price,
                   category_id, supplier_id, is_active, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// List products; inactive ones are included only on request
    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, sku, barcode, stock, min_stock, cost_price, price,
                   category_id, supplier_id, is_active, created_at, updated_at
            FROM products
            WHERE is_active = true OR $1
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Update product attributes (never stock)
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        let existing = self.get(product_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let price = input.price.unwrap_or(existing.price);
        let cost_price = input.cost_price.unwrap_or(existing.cost_price);

        if price < Decimal::ZERO || cost_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: "Prices cannot be negative".to_string(),
                message_fr: "Les prix ne peuvent pas être négatifs".to_string(),
            });
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, barcode = $3, min_stock = $4, cost_price = $5, price = $6,
                category_id = $7, supplier_id = $8, is_active = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, sku, barcode, stock, min_stock, cost_price, price,
                      category_id, supplier_id, is_active, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(&name)
        .bind(input.barcode.or(existing.barcode))
        .bind(input.min_stock.unwrap_or(existing.min_stock))
        .bind(cost_price)
        .bind(price)
        .bind(input.category_id.or(existing.category_id))
        .bind(input.supplier_id.or(existing.supplier_id))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Soft-delete: products referenced by sales history are deactivated, not removed
    pub async fn deactivate(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(product_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    /// Products at or below their reorder threshold
    pub async fn low_stock(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, sku, barcode, stock, min_stock, cost_price, price,
                   category_id, supplier_id, is_active, created_at, updated_at
            FROM products
            WHERE is_active = true AND stock <= min_stock
            ORDER BY stock ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }
}

//! Queries against the `products` table.

use crate::error::AppError;
use crate::model::Product;
use async_trait::async_trait;
use sqlx::PgPool;

const LIST_PRODUCTS: &str = "SELECT id, name, price_in_cents, quantity, created_at FROM products";

/// Queries available against the products table. Implementations must abandon
/// the underlying query when the returned future is dropped.
#[async_trait]
pub trait ProductQuerier: Send + Sync {
    /// All rows, in whatever order the storage engine yields them.
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;
}

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductQuerier for PgProductStore {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, Product>(LIST_PRODUCTS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

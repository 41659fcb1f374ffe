//! Database access: connection pool setup and the query contracts built on it.

mod products;

pub use products::{PgProductStore, ProductQuerier};

use crate::config::DbConfig;
use crate::error::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open the pool and verify connectivity; fails fast when the database is unreachable.
pub async fn connect(config: &DbConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options.clone())
        .await?;
    Ok(pool)
}

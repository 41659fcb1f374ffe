//! Schema migrations bundled from `migrations/`. Applied at startup; already-applied
//! versions are skipped (tracked by sqlx in `_sqlx_migrations`).

use crate::error::AppError;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await?;
    tracing::info!(count = MIGRATOR.iter().count(), "migrations applied");
    Ok(())
}

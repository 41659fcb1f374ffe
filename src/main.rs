//! ecom-api server: loads config from env, connects to PostgreSQL, applies
//! migrations, mounts health and product routes.

use ecom_api::{
    apply_migrations, init_tracing, redact_dsn, store, AppConfig, AppError, Application, LogConfig,
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(&LogConfig::from_env());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let dsn = redact_dsn(&config.db.dsn);
    let pool = store::connect(&config.db).await.map_err(|e| {
        tracing::error!(dsn = %dsn, error = %e, "failed to connect to database");
        e
    })?;
    tracing::info!(dsn = %dsn, "connected to database");

    apply_migrations(&pool).await?;

    let app = Application::new(config, pool);
    let router = app.mount();
    app.run(router).await
}

//! Application wiring and server lifecycle.

use crate::config::{AppConfig, ServerConfig};
use crate::error::AppError;
use crate::middleware;
use crate::routes::{common_routes, product_routes};
use crate::server;
use crate::service::ProductCatalog;
use crate::state::AppState;
use crate::store::PgProductStore;
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Full router for the given state: routes plus the middleware stack.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let routes = Router::new()
        .merge(common_routes())
        .merge(product_routes(state));
    middleware::apply(routes, server)
}

/// Process-wide container: configuration and the database pool.
pub struct Application {
    config: AppConfig,
    pool: PgPool,
}

impl Application {
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        Self { config, pool }
    }

    /// Wire store, service and handlers onto the router.
    pub fn mount(&self) -> Router {
        let store = PgProductStore::new(self.pool.clone());
        let catalog = ProductCatalog::new(Arc::new(store));
        build_router(AppState::new(Arc::new(catalog)), &self.config.server)
    }

    /// Serve until SIGINT/SIGTERM, then drain in-flight requests and close the pool.
    pub async fn run(self, router: Router) -> Result<(), AppError> {
        let listener = TcpListener::bind(&self.config.server.addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "starting server");
        server::serve(listener, router, &self.config.server, shutdown_signal()).await?;
        tracing::info!("server stopped; closing database pool");
        self.pool.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

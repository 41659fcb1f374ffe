//! ecom-api: product catalogue REST service on PostgreSQL.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod model;
pub mod observability;
pub mod response;
pub mod routes;
pub mod server;
pub mod service;
pub mod state;
pub mod store;

pub use app::{build_router, Application};
pub use config::{redact_dsn, AppConfig, DbConfig, LogConfig, ServerConfig};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use model::Product;
pub use observability::init_tracing;
pub use response::{error_text, success_many};
pub use routes::{common_routes, product_routes};
pub use service::{ProductCatalog, ProductService};
pub use state::AppState;
pub use store::{PgProductStore, ProductQuerier};

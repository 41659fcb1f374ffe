//! Common routes: health.

use crate::handlers::health;
use axum::{routing::get, Router};

/// GET /health. Stateless, so it answers even when the database is down.
pub fn common_routes() -> Router {
    Router::new().route("/health", get(health))
}

//! Product routes.

use crate::handlers::list_products;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn product_routes(state: AppState) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .with_state(state)
}

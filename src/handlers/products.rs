//! Product handlers.

use crate::response::success_many;
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

/// GET /products: every product as a JSON array, or a plain-text 500 on failure.
pub async fn list_products(State(state): State<AppState>) -> Response {
    match state.products.list_products().await {
        Ok(products) => success_many(products).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "list products failed");
            err.into_response()
        }
    }
}

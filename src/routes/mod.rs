//! Route tables.

mod common;
mod products;

pub use common::common_routes;
pub use products::product_routes;

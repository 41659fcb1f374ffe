//! HTTP handlers.

pub mod health;
pub mod products;
pub use health::health;
pub use products::list_products;

//! Domain services sitting between handlers and the store.

mod products;
pub use products::{ProductCatalog, ProductService};

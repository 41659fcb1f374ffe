//! Product operations exposed to the HTTP layer, independent of storage.

use crate::error::AppError;
use crate::model::Product;
use crate::store::ProductQuerier;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ProductService: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;
}

/// Forwards every call to the underlying querier; results and errors pass through untouched.
#[derive(Clone)]
pub struct ProductCatalog {
    querier: Arc<dyn ProductQuerier>,
}

impl ProductCatalog {
    pub fn new(querier: Arc<dyn ProductQuerier>) -> Self {
        Self { querier }
    }
}

#[async_trait]
impl ProductService for ProductCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.querier.list_products().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct Fixed(Vec<Product>);

    #[async_trait]
    impl ProductQuerier for Fixed {
        async fn list_products(&self) -> Result<Vec<Product>, AppError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl ProductQuerier for Failing {
        async fn list_products(&self) -> Result<Vec<Product>, AppError> {
            Err(AppError::Db(sqlx::Error::PoolTimedOut))
        }
    }

    fn product(id: i64, name: &str) -> Product {
        Product {
            id,
            name: name.into(),
            price_in_cents: 1999,
            quantity: 3,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn returns_rows_unchanged_and_in_order() {
        let rows = vec![product(7, "mug"), product(2, "kettle"), product(9, "tea")];
        let svc = ProductCatalog::new(Arc::new(Fixed(rows.clone())));
        assert_eq!(svc.list_products().await.unwrap(), rows);
    }

    #[tokio::test]
    async fn propagates_querier_error() {
        let svc = ProductCatalog::new(Arc::new(Failing));
        let err = svc.list_products().await.unwrap_err();
        assert!(matches!(err, AppError::Db(sqlx::Error::PoolTimedOut)));
    }
}

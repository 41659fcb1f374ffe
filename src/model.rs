//! Domain records, returned verbatim from storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price_in_cents: i32,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

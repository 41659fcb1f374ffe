pub const HEALTH_BODY: &str = "All good.";

/// GET /health: constant liveness answer that never touches the database.
pub async fn health() -> &'static str {
    HEALTH_BODY
}

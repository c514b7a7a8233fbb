//! HTTP request handlers.

pub mod history;

use axum::Json;
use parley_types::api::HealthStatus;

/// GET /health - Liveness probe used by the chat client at startup.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

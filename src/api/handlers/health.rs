//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};
use rdkafka::producer::Producer;
use std::time::Duration;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

const BROKER_METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /api/health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` on the pool
/// 2. **Producer**: broker metadata fetch, or `disabled` when publishing is off
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "producer": { "status": "ok", "message": "1 broker(s) reachable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let producer_check = check_producer(&state).await;

    let all_healthy = db_check.is_healthy() && producer_check.is_healthy();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            producer: producer_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool.as_ref())
        .await
    {
        Ok(_) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// Metadata requests block on librdkafka, so they run off the async workers.
async fn check_producer(state: &AppState) -> CheckStatus {
    let Some(producer) = state.producer.clone() else {
        return CheckStatus::disabled();
    };

    let result = tokio::task::spawn_blocking(move || {
        producer
            .client()
            .fetch_metadata(None, BROKER_METADATA_TIMEOUT)
            .map(|metadata| metadata.brokers().len())
    })
    .await;

    match result {
        Ok(Ok(brokers)) => CheckStatus::ok(format!("{} broker(s) reachable", brokers)),
        Ok(Err(e)) => CheckStatus::error(format!("Broker error: {}", e)),
        Err(e) => CheckStatus::error(format!("Health check failed: {}", e)),
    }
}

//! Liveness, readiness and metrics endpoints.

use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Root status message. Always 200, whatever the dependency state.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": state.facade.health() })))
}

/// Liveness endpoint for Docker/K8s.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "skillbridge-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check. The model is required, so an unhealthy model answers 503.
/// The history store is optional: absent or unreachable is reported but does
/// not fail the check.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let readiness = state.facade.readiness().await;
    let (status, label) = if readiness.model_healthy {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "history_store": readiness.history_store.as_str(),
            "model": readiness.model,
        })),
    )
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

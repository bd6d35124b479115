/// Health check endpoints for liveness and readiness probes
///
/// Liveness only proves the process responds. Readiness checks that the
/// blob store and document index are reachable.
use crate::{context::AppContext, metrics};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_endpoint))
}

/// Basic health check
pub async fn health_basic() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
pub async fn liveness_probe() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe. Returns 503 when a backend is unreachable.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Err(e) = ctx.blob_store.check().await {
        tracing::warn!(error = %e, "readiness_probe_failed: blob storage check failed");
        return Err(not_ready("blob_storage"));
    }

    if let Err(e) = ctx.index.ping().await {
        tracing::warn!(error = %e, "readiness_probe_failed: index check failed");
        return Err(not_ready("index"));
    }

    Ok(Json(json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

fn not_ready(component: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "not_ready",
            "component": component
        })),
    )
}

/// Prometheus text exposition
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

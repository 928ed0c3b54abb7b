use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use rema::calculators::calculator_router;
use rema::inventory::{inventory_router, InventoryService, PropertyRepository};
use rema::valuation::{prediction_router, ValuationEngine};
use serde_json::json;
use std::sync::Arc;

/// Prediction, inventory and calculator APIs plus the operational endpoints.
pub(crate) fn app_router<R>(engine: Arc<ValuationEngine>, inventory: Arc<InventoryService<R>>) -> Router
where
    R: PropertyRepository + 'static,
{
    prediction_router(engine)
        .merge(inventory_router(inventory))
        .merge(calculator_router())
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

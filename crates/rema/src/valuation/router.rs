use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tracing::warn;

use super::engine::{PredictionError, ValuationEngine};

/// Router exposing the live price calculator.
pub fn prediction_router(engine: Arc<ValuationEngine>) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict_handler))
        .with_state(engine)
}

pub(crate) async fn predict_handler(
    State(engine): State<Arc<ValuationEngine>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response {
    let Value::Object(attributes) = payload else {
        let payload = json!({
            "error": "prediction payload must be a JSON object",
            "fields": [],
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    };

    match engine.appraise(&attributes) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(PredictionError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "fields": error.fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(PredictionError::Inference(error)) => {
            warn!(%error, "price inference failed");
            let payload = json!({
                "error": format!("prediction failed: {error}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

use std::sync::Arc;

use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::valuation::router::{predict_handler, prediction_router};

fn predict_request(body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/api/v1/predict")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn predict_route_returns_estimate() {
    let router = prediction_router(Arc::new(engine_with(FixedModel(100_000.0))));
    let mut payload = calculator_payload();
    payload.insert("listed_price".to_string(), json!(115_000));

    let response = router
        .oneshot(predict_request(serde_json::Value::Object(payload)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["predicted_price"], 100_000.0);
    assert_eq!(body["valuation"], "overvalued");
    assert_eq!(body["valuation_percentage"], 15.0);
    assert_eq!(body["confidence"], "high");
}

#[tokio::test]
async fn predict_handler_rejects_unreadable_fields() {
    let engine = Arc::new(bundled_engine());

    let response = predict_handler(
        State(engine),
        axum::Json(json!({ "surface_area": "spacious", "bathroom": -2 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("field list")
        .iter()
        .filter_map(|entry| entry["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["surface_area", "bathroom"]);
}

#[tokio::test]
async fn predict_handler_rejects_non_object_payloads() {
    let response = predict_handler(State(Arc::new(bundled_engine())), axum::Json(json!([1, 2]))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn predict_handler_reports_inference_failure() {
    let response = predict_handler(
        State(Arc::new(engine_with(FailingModel))),
        axum::Json(serde_json::Value::Object(calculator_payload())),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .starts_with("prediction failed"));
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::mortgage::{mortgage, MortgageInput};
use super::roi::{roi, RoiInput};
use crate::valuation::ValidationError;

/// Stateless financing calculators.
pub fn calculator_router() -> Router {
    Router::new()
        .route("/api/v1/calculators/mortgage", post(mortgage_handler))
        .route("/api/v1/calculators/roi", post(roi_handler))
}

pub(crate) async fn mortgage_handler(Json(input): Json<MortgageInput>) -> Response {
    calculation_response(mortgage(&input))
}

pub(crate) async fn roi_handler(Json(input): Json<RoiInput>) -> Response {
    calculation_response(roi(&input))
}

fn calculation_response<T: Serialize>(result: Result<T, ValidationError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
                "fields": error.fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

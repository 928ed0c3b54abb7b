use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{Property, PropertyId};
use super::query::{InvalidQueryError, InventoryView, QuerySpec};
use super::repository::{PropertyRepository, RepositoryError};
use super::service::{InventoryService, InventoryServiceError, DEFAULT_SIMILAR_LIMIT};

type Params = Query<BTreeMap<String, String>>;

/// Read-only inventory endpoints: listings, opportunities, facets and comparisons.
pub fn inventory_router<R>(service: Arc<InventoryService<R>>) -> Router
where
    R: PropertyRepository + 'static,
{
    Router::new()
        .route("/api/v1/properties", get(list_handler::<R>))
        .route(
            "/api/v1/properties/opportunities",
            get(opportunities_handler::<R>),
        )
        .route("/api/v1/properties/filters", get(filters_handler::<R>))
        .route("/api/v1/properties/compare", get(compare_handler::<R>))
        .route("/api/v1/properties/stats", get(stats_handler::<R>))
        .route("/api/v1/properties/:property_id", get(detail_handler::<R>))
        .route(
            "/api/v1/properties/:property_id/similar",
            get(similar_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Query(params): Params,
) -> Response
where
    R: PropertyRepository + 'static,
{
    let spec = match QuerySpec::from_params(InventoryView::Listings, &params, service.limits()) {
        Ok(spec) => spec,
        Err(error) => return error_response(error.into()),
    };

    match service.list_properties(&spec) {
        Ok(page) => {
            (StatusCode::OK, axum::Json(page.map_ref(Property::view))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn opportunities_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Query(params): Params,
) -> Response
where
    R: PropertyRepository + 'static,
{
    let spec = match QuerySpec::from_params(InventoryView::Opportunities, &params, service.limits())
    {
        Ok(spec) => spec,
        Err(error) => return error_response(error.into()),
    };

    match service.list_opportunities(&spec) {
        Ok(page) => {
            (StatusCode::OK, axum::Json(page.map_ref(Property::view))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn filters_handler<R>(State(service): State<Arc<InventoryService<R>>>) -> Response
where
    R: PropertyRepository + 'static,
{
    match service.filter_options() {
        Ok(options) => (StatusCode::OK, axum::Json(options)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn compare_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Query(params): Params,
) -> Response
where
    R: PropertyRepository + 'static,
{
    let ids = match parse_ids(params.get("ids").map(String::as_str).unwrap_or_default()) {
        Ok(ids) => ids,
        Err(error) => return error_response(error.into()),
    };

    match service.compare(&ids) {
        Ok(comparison) => (StatusCode::OK, axum::Json(comparison.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R>(State(service): State<Arc<InventoryService<R>>>) -> Response
where
    R: PropertyRepository + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: PropertyRepository + 'static,
{
    let id = match parse_id(&property_id) {
        Ok(id) => id,
        Err(error) => return error_response(error.into()),
    };

    match service.get(id) {
        Ok(property) => (StatusCode::OK, axum::Json(property.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn similar_handler<R>(
    State(service): State<Arc<InventoryService<R>>>,
    Path(property_id): Path<String>,
    Query(params): Params,
) -> Response
where
    R: PropertyRepository + 'static,
{
    let id = match parse_id(&property_id) {
        Ok(id) => id,
        Err(error) => return error_response(error.into()),
    };
    let limit = match params.get("limit").map(|raw| raw.trim()) {
        None | Some("") => DEFAULT_SIMILAR_LIMIT,
        Some(raw) => match raw.parse::<usize>() {
            Ok(limit) => limit,
            Err(_) => {
                let error = InvalidQueryError::new("limit", format!("'{raw}' is not a count"));
                return error_response(error.into());
            }
        },
    };

    match service.similar(id, limit) {
        Ok(properties) => {
            let views: Vec<_> = properties.iter().map(Property::view).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn parse_id(raw: &str) -> Result<PropertyId, InvalidQueryError> {
    raw.trim()
        .parse::<u64>()
        .map(PropertyId)
        .map_err(|_| InvalidQueryError::new("id", format!("'{raw}' is not a property id")))
}

fn parse_ids(raw: &str) -> Result<Vec<PropertyId>, InvalidQueryError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map(PropertyId)
                .map_err(|_| InvalidQueryError::new("ids", format!("'{part}' is not a property id")))
        })
        .collect()
}

fn error_response(error: InventoryServiceError) -> Response {
    let (status, payload) = match &error {
        InventoryServiceError::Validation(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": validation.to_string(), "fields": validation.fields }),
        ),
        InventoryServiceError::InvalidQuery(invalid) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": invalid.to_string(), "parameter": invalid.parameter }),
        ),
        InventoryServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "property not found" }),
        ),
        InventoryServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "property already exists" }),
        ),
        InventoryServiceError::Repository(RepositoryError::Unavailable(_)) => {
            error!(%error, "inventory repository unavailable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": error.to_string() }),
            )
        }
    };
    (status, axum::Json(payload)).into_response()
}

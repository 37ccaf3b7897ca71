use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::service::{EligibilityError, EligibilityService};

/// Router exposing the postcode search and the property eligibility check.
pub fn eligibility_router(service: Arc<EligibilityService>) -> Router {
    Router::new()
        .route("/api/v1/addresses", get(addresses_handler))
        .route("/api/v1/propertyeligible", get(property_eligible_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddressQuery {
    #[serde(default)]
    pub(crate) postcode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PropertyQuery {
    #[serde(default)]
    pub(crate) property_id: Option<String>,
}

pub(crate) async fn addresses_handler(
    State(service): State<Arc<EligibilityService>>,
    Query(query): Query<AddressQuery>,
) -> Response {
    let postcode = query.postcode.unwrap_or_default();
    match service.search_addresses(&postcode).await {
        Ok(addresses) => (StatusCode::OK, Json(addresses)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn property_eligible_handler(
    State(service): State<Arc<EligibilityService>>,
    Query(query): Query<PropertyQuery>,
) -> Response {
    let property_id = query.property_id.unwrap_or_default();
    match service.verify_property(&property_id).await {
        Ok(verdict) => (StatusCode::OK, Json(verdict)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: EligibilityError) -> Response {
    let status = match &err {
        EligibilityError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EligibilityError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        EligibilityError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "eligibility request failed");
    }

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}

use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use housing_eligibility::eligibility::{eligibility_router, EligibilityService};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Eligibility API plus health, readiness and metrics endpoints.
pub(crate) fn with_operational_routes(service: Arc<EligibilityService>) -> Router {
    eligibility_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::FixtureRegistry;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use housing_eligibility::eligibility::{EligibilityRuleSet, PipelineSettings};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(ready: bool) -> Router {
        let service = EligibilityService::new(
            FixtureRegistry::sample().into_gateways(),
            EligibilityRuleSet::standard(),
            PipelineSettings::default(),
        );
        with_operational_routes(Arc::new(service)).layer(Extension(state(ready)))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, payload) = get_json(app(false), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let (status, payload) = get_json(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "initializing");

        let (status, payload) = get_json(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "ready");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let response = metrics_endpoint(Extension(state(true))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/plain; version=0.0.4")
        );
    }

    #[tokio::test]
    async fn eligibility_routes_are_mounted() {
        let (status, payload) =
            get_json(app(true), "/api/v1/propertyeligible?propertyId=00023402").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["propertyEligible"], false);
        assert_eq!(
            payload["reason"],
            "The asset with property ID 00023402 is managed by a TMO"
        );

        let (status, payload) = get_json(app(true), "/api/v1/addresses?postcode=E8%201DY").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = payload
            .as_array()
            .expect("address list")
            .iter()
            .filter_map(|address| address["reference"]["id"].as_str())
            .collect();
        assert!(ids.contains(&"00023400"));
        assert!(!ids.contains(&"00023401"));
    }
}

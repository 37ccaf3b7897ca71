use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use housing_eligibility::config::{ServiceEndpoint, UpstreamConfig};
use housing_eligibility::eligibility::{
    check_batch, eligibility_router, http_gateways, EligibilityRuleSet, EligibilityService,
    PipelineSettings,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "integration-key";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    search_text: String,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(API_KEY)
}

async fn search_assets(headers: HeaderMap, Query(params): Query<SearchParams>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if params.search_text != "E8 1DY" {
        return Json(json!({ "results": { "assets": [] } })).into_response();
    }
    let asset = |id: &str, line: &str| {
        json!({
            "assetId": id,
            "assetAddress": { "addressLine1": line, "addressLine3": "LONDON", "postCode": "E8 1DY" }
        })
    };
    Json(json!({
        "results": {
            "assets": [
                asset("00023400", "1 Queensbridge Road"),
                asset("00023401", "Queensbridge Block"),
                asset("00023402", "3 Queensbridge Road"),
                asset("00023403", "5 Queensbridge Road"),
                asset("00023404", "7 Queensbridge Road")
            ]
        }
    }))
    .into_response()
}

async fn asset_by_id(headers: HeaderMap, Path(asset_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let (asset_type, tmo, tenure) = match asset_id.as_str() {
        "00023400" => ("Dwelling", false, "tenure-sec"),
        "00023401" => ("Block", false, "tenure-sec"),
        "00023402" => ("Flat", true, "tenure-int"),
        "00023404" => ("House", false, "tenure-sec"),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(json!({
        "assetId": asset_id,
        "assetType": asset_type,
        "assetManagement": { "isTMOManaged": tmo },
        "tenure": { "id": tenure }
    }))
    .into_response()
}

async fn tenure_by_id(headers: HeaderMap, Path(tenure_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let (code, description) = match tenure_id.as_str() {
        "tenure-sec" => ("SEC", "Secure"),
        "tenure-int" => ("INT", "Introductory"),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(json!({ "id": tenure_id, "tenureType": { "code": code, "description": description } }))
        .into_response()
}

async fn location_alerts(headers: HeaderMap, Path(reference): Path<String>) -> Response {
    if !authorized(&headers) || headers.get("x-hackney-user").is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let alerts = if reference == "00023404" {
        json!([
            { "type": "VA", "comments": "Verbal abuse", "startDate": "2023-04-01" },
            { "type": "DIS", "comments": "Disability", "startDate": "2022-10-12" }
        ])
    } else {
        json!([])
    };
    Json(json!({ "alerts": alerts, "reference": reference })).into_response()
}

async fn start_upstreams() -> UpstreamConfig {
    let router = Router::new()
        .route("/housing-search/api/v1/search/assets", get(search_assets))
        .route("/asset/api/v1/assets/assetId/:asset_id", get(asset_by_id))
        .route("/tenure/api/v1/tenures/:tenure_id", get(tenure_by_id))
        .route(
            "/repairs-hub/api/v2/properties/:reference/location-alerts",
            get(location_alerts),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("upstream stub runs");
    });

    let endpoint = |path: &str| ServiceEndpoint {
        base_url: format!("http://{addr}/{path}"),
        api_key: API_KEY.to_string(),
    };
    UpstreamConfig {
        housing_search: endpoint("housing-search/api/v1/"),
        asset: endpoint("asset/api/v1/"),
        tenure: endpoint("tenure/api/v1/"),
        repairs_hub_alerts: endpoint("repairs-hub/api/v2/properties/"),
        timeout: Duration::from_secs(5),
    }
}

async fn build_service() -> Arc<EligibilityService> {
    let upstreams = start_upstreams().await;
    let gateways = http_gateways(&upstreams).expect("gateways build");
    Arc::new(EligibilityService::new(
        gateways,
        EligibilityRuleSet::standard(),
        PipelineSettings::default(),
    ))
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("route executes");
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn postcode_search_keeps_listable_addresses() {
    let router = eligibility_router(build_service().await);

    let (status, payload) = get_json(router, "/api/v1/addresses?postcode=E8%201DY").await;

    assert_eq!(status, StatusCode::OK);
    let mut ids: Vec<&str> = payload
        .as_array()
        .expect("address list")
        .iter()
        .filter_map(|address| address["reference"]["id"].as_str())
        .collect();
    ids.sort_unstable();
    // The TMO-managed flat and the property with alerts still list; only the
    // single-property check looks at management and alerts.
    assert_eq!(ids, vec!["00023400", "00023402", "00023404"]);
}

#[tokio::test]
async fn unknown_postcode_returns_an_empty_list() {
    let router = eligibility_router(build_service().await);

    let (status, payload) = get_json(router, "/api/v1/addresses?postcode=N1%201AA").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!([]));
}

#[tokio::test]
async fn property_checks_cover_each_outcome() {
    let service = build_service().await;
    let cases = [
        ("00023400", true, "The property is valid".to_string()),
        (
            "00023401",
            false,
            "The asset with 00023401 is not eligible because of the asset type".to_string(),
        ),
        (
            "00023402",
            false,
            "The asset with property ID 00023402 is managed by a TMO".to_string(),
        ),
        (
            "00023403",
            false,
            "The asset with property ID 00023403 cannot be found".to_string(),
        ),
        (
            "00023404",
            false,
            "Property 00023404 is not eligible for Online Repairs due to having 2 active Location Alert(s)"
                .to_string(),
        ),
    ];

    for (property_id, eligible, reason) in cases {
        let router = eligibility_router(service.clone());
        let uri = format!("/api/v1/propertyeligible?propertyId={property_id}");
        let (status, payload) = get_json(router, &uri).await;

        assert_eq!(status, StatusCode::OK, "{property_id}");
        assert_eq!(payload["propertyEligible"], json!(eligible), "{property_id}");
        assert_eq!(payload["reason"], json!(reason), "{property_id}");
    }
}

#[tokio::test]
async fn rejected_credentials_surface_as_server_errors() {
    let mut upstreams = start_upstreams().await;
    upstreams.asset.api_key = "wrong-key".to_string();
    let service = Arc::new(EligibilityService::new(
        http_gateways(&upstreams).expect("gateways build"),
        EligibilityRuleSet::standard(),
        PipelineSettings::default(),
    ));

    let (status, payload) = get_json(
        eligibility_router(service),
        "/api/v1/propertyeligible?propertyId=00023400",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        payload["error"],
        "Asset API request failed with status code 401"
    );
}

#[tokio::test]
async fn batch_check_writes_csv_results() {
    let service = build_service().await;
    let input = "property_id\n00023400\n00023402\n";
    let mut output = Vec::new();

    let summary = check_batch(&service, input.as_bytes(), &mut output)
        .await
        .expect("batch completes");

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.eligible, 1);
    assert_eq!(summary.failed, 0);
    let written = String::from_utf8(output).expect("utf8");
    assert!(written.contains("00023400,true,The property is valid"));
    assert!(written.contains("00023402,false,The asset with property ID 00023402 is managed by a TMO"));
}

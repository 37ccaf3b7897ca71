//! reqwest-backed implementations of the upstream lookups.
//!
//! Not-found responses map to `Ok(None)`; any other non-success status is a
//! [`GatewayError::Status`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::domain::{
    Alert, AlertsBundle, Asset, AssetManagement, AssetType, PropertyAddress, Reference,
    TenureInformation,
};
use super::gateways::{
    require_argument, AddressLookup, AlertsLookup, AssetLookup, GatewayError, LookupGateways,
    TenureLookup,
};
use crate::config::{ServiceEndpoint, UpstreamConfig};

const HOUSING_SEARCH: &str = "HousingSearch";
const ASSET: &str = "Asset";
const TENURE_INFORMATION: &str = "TenureInformation";
const REPAIRS_HUB_ALERTS: &str = "RepairsHubAlerts";

/// Builds all four HTTP gateways from upstream configuration.
pub fn http_gateways(config: &UpstreamConfig) -> Result<LookupGateways, GatewayError> {
    let timeout = config.timeout;
    Ok(LookupGateways {
        addresses: Arc::new(HousingSearchGateway::new(&config.housing_search, timeout)?),
        assets: Arc::new(AssetGateway::new(&config.asset, timeout)?),
        tenures: Arc::new(TenureGateway::new(&config.tenure, timeout)?),
        alerts: Arc::new(RepairsHubAlertsGateway::new(
            &config.repairs_hub_alerts,
            timeout,
        )?),
    })
}

#[derive(Debug, Clone)]
struct UpstreamClient {
    service: &'static str,
    client: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    fn new(
        service: &'static str,
        endpoint: &ServiceEndpoint,
        timeout: Duration,
        legacy_headers: bool,
    ) -> Result<Self, GatewayError> {
        let configuration = |message: String| GatewayError::Configuration { service, message };

        let base_url = Url::parse(&endpoint.base_url)
            .map_err(|err| configuration(format!("invalid base URL: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(configuration("base URL cannot carry paths".to_string()));
        }

        let key = HeaderValue::from_str(&endpoint.api_key)
            .map_err(|_| configuration("API key is not a valid header value".to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, key.clone());
        if legacy_headers {
            headers.insert("x-hackney-user", key);
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| configuration(err.to_string()))?;

        Ok(Self {
            service,
            client,
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, GatewayError> {
        debug!(service = self.service, %url, "upstream request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| GatewayError::Transport {
                service: self.service,
                message: err.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                service: self.service,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|err| GatewayError::Decode {
                service: self.service,
                message: err.to_string(),
            })
    }
}

/// Address search backed by the Housing Search API.
#[derive(Debug, Clone)]
pub struct HousingSearchGateway {
    upstream: UpstreamClient,
}

impl HousingSearchGateway {
    pub fn new(endpoint: &ServiceEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            upstream: UpstreamClient::new(HOUSING_SEARCH, endpoint, timeout, false)?,
        })
    }
}

#[async_trait]
impl AddressLookup for HousingSearchGateway {
    async fn search_by_postcode(
        &self,
        postcode: &str,
    ) -> Result<Vec<PropertyAddress>, GatewayError> {
        let postcode = require_argument(postcode, "postcode")?;
        let url = self.upstream.url(&["search", "assets"]);
        let response: Option<HousingSearchResponse> = self
            .upstream
            .get_json(
                url,
                &[("searchText", postcode), ("useCustomSorting", "true")],
            )
            .await?;

        Ok(response
            .map(|body| body.results.assets)
            .unwrap_or_default()
            .into_iter()
            .map(SearchAsset::into_address)
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct AssetGateway {
    upstream: UpstreamClient,
}

impl AssetGateway {
    pub fn new(endpoint: &ServiceEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            upstream: UpstreamClient::new(ASSET, endpoint, timeout, false)?,
        })
    }
}

#[async_trait]
impl AssetLookup for AssetGateway {
    async fn retrieve_asset(&self, asset_id: &str) -> Result<Option<Asset>, GatewayError> {
        let asset_id = require_argument(asset_id, "assetId")?;
        let url = self.upstream.url(&["assets", "assetId", asset_id]);
        let response: Option<AssetResponse> = self.upstream.get_json(url, &[]).await?;
        Ok(response.map(AssetResponse::into_asset))
    }
}

#[derive(Debug, Clone)]
pub struct TenureGateway {
    upstream: UpstreamClient,
}

impl TenureGateway {
    pub fn new(endpoint: &ServiceEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            upstream: UpstreamClient::new(TENURE_INFORMATION, endpoint, timeout, false)?,
        })
    }
}

#[async_trait]
impl TenureLookup for TenureGateway {
    async fn retrieve_tenure_type(
        &self,
        tenure_id: &str,
    ) -> Result<Option<TenureInformation>, GatewayError> {
        let tenure_id = require_argument(tenure_id, "tenureId")?;
        let url = self.upstream.url(&["tenures", tenure_id]);
        let response: Option<TenureResponse> = self.upstream.get_json(url, &[]).await?;
        Ok(response.map(TenureResponse::into_tenure))
    }
}

/// Location alerts from the Repairs Hub properties API.
#[derive(Debug, Clone)]
pub struct RepairsHubAlertsGateway {
    upstream: UpstreamClient,
}

impl RepairsHubAlertsGateway {
    pub fn new(endpoint: &ServiceEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            upstream: UpstreamClient::new(REPAIRS_HUB_ALERTS, endpoint, timeout, true)?,
        })
    }
}

#[async_trait]
impl AlertsLookup for RepairsHubAlertsGateway {
    async fn get_location_alerts(
        &self,
        property_reference: &str,
    ) -> Result<Option<AlertsBundle>, GatewayError> {
        let property_reference = require_argument(property_reference, "propertyReference")?;
        let url = self.upstream.url(&[property_reference, "location-alerts"]);
        let response: Option<AlertsResponse> = self.upstream.get_json(url, &[]).await?;
        Ok(response.map(AlertsResponse::into_bundle))
    }
}

#[derive(Debug, Deserialize)]
struct HousingSearchResponse {
    #[serde(default)]
    results: HousingSearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct HousingSearchResults {
    #[serde(default)]
    assets: Vec<SearchAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchAsset {
    #[serde(default)]
    asset_id: Option<String>,
    #[serde(default)]
    asset_address: SearchAssetAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchAssetAddress {
    address_line1: Option<String>,
    address_line2: Option<String>,
    address_line3: Option<String>,
    address_line4: Option<String>,
    post_code: Option<String>,
}

impl SearchAsset {
    fn into_address(self) -> PropertyAddress {
        let reference = self
            .asset_id
            .filter(|id| !id.trim().is_empty())
            .map(|id| Reference {
                id,
                allocated_by: Some("HousingSearchApi".to_string()),
                description: None,
            });

        let SearchAssetAddress {
            address_line1,
            address_line2,
            address_line3,
            address_line4,
            post_code,
        } = self.asset_address;
        let address_line = [address_line1, address_line2, address_line3, address_line4]
            .into_iter()
            .flatten()
            .filter(|line| !line.trim().is_empty())
            .collect();

        PropertyAddress {
            postal_code: post_code,
            building_number: None,
            address_line,
            city_name: None,
            reference,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetResponse {
    #[serde(default)]
    asset_id: Option<String>,
    #[serde(default)]
    asset_type: Option<AssetType>,
    #[serde(default)]
    asset_management: Option<AssetManagementResponse>,
    #[serde(default)]
    tenure: Option<AssetTenureResponse>,
}

#[derive(Debug, Deserialize)]
struct AssetManagementResponse {
    #[serde(rename = "isTMOManaged", alias = "isTmoManaged", default)]
    is_tmo_managed: bool,
}

#[derive(Debug, Deserialize)]
struct AssetTenureResponse {
    #[serde(default)]
    id: Option<String>,
}

impl AssetResponse {
    fn into_asset(self) -> Asset {
        Asset {
            asset_id: self.asset_id,
            asset_type: self.asset_type.unwrap_or(AssetType::Other),
            management: self.asset_management.map(|management| AssetManagement {
                is_tmo_managed: management.is_tmo_managed,
            }),
            tenure_reference: self.tenure.and_then(|tenure| tenure.id),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenureResponse {
    #[serde(default)]
    tenure_type: Option<TenureTypeResponse>,
}

#[derive(Debug, Deserialize)]
struct TenureTypeResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl TenureResponse {
    fn into_tenure(self) -> TenureInformation {
        match self.tenure_type {
            Some(tenure_type) => TenureInformation {
                tenure_type_code: tenure_type.code,
                tenure_type_description: tenure_type.description,
            },
            None => TenureInformation {
                tenure_type_code: None,
                tenure_type_description: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default, alias = "Alerts")]
    alerts: Vec<AlertResponse>,
    #[serde(default, alias = "Reference")]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertResponse {
    #[serde(default, alias = "type", alias = "AlertCode")]
    alert_code: Option<String>,
    #[serde(default, alias = "comments", alias = "Description")]
    description: Option<String>,
    #[serde(default, alias = "StartDate", deserialize_with = "lenient_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, alias = "EndDate", deserialize_with = "lenient_date")]
    end_date: Option<NaiveDate>,
}

impl AlertsResponse {
    fn into_bundle(self) -> AlertsBundle {
        AlertsBundle {
            alerts: self
                .alerts
                .into_iter()
                .map(|alert| Alert {
                    code: alert.alert_code.unwrap_or_default(),
                    description: alert.description,
                    start_date: alert.start_date,
                    end_date: alert.end_date,
                })
                .collect(),
            reference: self.reference,
        }
    }
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    trimmed
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

use async_trait::async_trait;
use housing_eligibility::config::{AppConfig, UpstreamConfig};
use housing_eligibility::eligibility::{
    http_gateways, AddressLookup, Alert, AlertsBundle, AlertsLookup, Asset, AssetLookup,
    AssetManagement, AssetType, EligibilityService, GatewayError, LookupGateways,
    PropertyAddress, Reference, TenureInformation, TenureLookup,
};
use housing_eligibility::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service wired to the real upstream APIs named in the environment.
pub(crate) fn live_service(config: &AppConfig) -> Result<EligibilityService, AppError> {
    let upstreams = UpstreamConfig::load()?;
    let gateways = http_gateways(&upstreams)?;
    Ok(EligibilityService::new(
        gateways,
        config.rules.clone(),
        config.pipeline,
    ))
}

/// In-memory stand-in for all four upstream registries.
#[derive(Debug, Default, Clone)]
pub(crate) struct FixtureRegistry {
    addresses: Vec<PropertyAddress>,
    assets: HashMap<String, Asset>,
    tenures: HashMap<String, TenureInformation>,
    alerts: HashMap<String, AlertsBundle>,
}

pub(crate) const FIXTURE_POSTCODE: &str = "E8 1DY";

impl FixtureRegistry {
    /// One property per outcome, all on the same street.
    pub(crate) fn sample() -> Self {
        let mut registry = Self::default();
        registry
            .property("00023400", "1", AssetType::Dwelling, false, Some("SEC"))
            .property("00023401", "Block A", AssetType::Block, false, Some("SEC"))
            .property("00023402", "3", AssetType::Flat, true, Some("INT"))
            .property("00023404", "7", AssetType::House, false, Some("SEC"))
            .property("00023405", "9", AssetType::StudioFlat, false, Some("LHS"))
            .property("00023406", "11", AssetType::SelfContainedBedsit, false, None);

        registry.addresses.push(street_address("00023403", "5"));
        registry.alerts.insert(
            "00023404".to_string(),
            AlertsBundle {
                alerts: vec![
                    alert("VA", "Verbal abuse or threat of"),
                    alert("DIS", "Property adapted for disability"),
                ],
                reference: Some("00023404".to_string()),
            },
        );
        registry
    }

    pub(crate) fn property_ids(&self) -> Vec<String> {
        self.addresses
            .iter()
            .filter_map(|address| address.asset_id().map(str::to_string))
            .collect()
    }

    pub(crate) fn into_gateways(self) -> LookupGateways {
        let registry = Arc::new(self);
        LookupGateways {
            addresses: registry.clone(),
            assets: registry.clone(),
            tenures: registry.clone(),
            alerts: registry,
        }
    }

    fn property(
        &mut self,
        asset_id: &str,
        number: &str,
        asset_type: AssetType,
        tmo_managed: bool,
        tenure_code: Option<&str>,
    ) -> &mut Self {
        let tenure_id = format!("tenure-{asset_id}");
        self.addresses.push(street_address(asset_id, number));
        self.assets.insert(
            asset_id.to_string(),
            Asset {
                asset_id: Some(asset_id.to_string()),
                asset_type,
                management: Some(AssetManagement {
                    is_tmo_managed: tmo_managed,
                }),
                tenure_reference: Some(tenure_id.clone()),
            },
        );
        self.tenures.insert(
            tenure_id,
            TenureInformation {
                tenure_type_code: tenure_code.map(str::to_string),
                tenure_type_description: None,
            },
        );
        self
    }
}

fn street_address(asset_id: &str, number: &str) -> PropertyAddress {
    PropertyAddress {
        postal_code: Some(FIXTURE_POSTCODE.to_string()),
        building_number: Some(number.to_string()),
        address_line: vec![format!("{number} Queensbridge Road"), "Hackney".to_string()],
        city_name: Some("London".to_string()),
        reference: Some(Reference {
            id: asset_id.to_string(),
            allocated_by: Some("FixtureRegistry".to_string()),
            description: None,
        }),
    }
}

fn alert(code: &str, description: &str) -> Alert {
    Alert {
        code: code.to_string(),
        description: Some(description.to_string()),
        start_date: None,
        end_date: None,
    }
}

#[async_trait]
impl AddressLookup for FixtureRegistry {
    async fn search_by_postcode(
        &self,
        postcode: &str,
    ) -> Result<Vec<PropertyAddress>, GatewayError> {
        let wanted = normalize_postcode(postcode);
        Ok(self
            .addresses
            .iter()
            .filter(|address| {
                address
                    .postal_code
                    .as_deref()
                    .is_some_and(|code| normalize_postcode(code) == wanted)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssetLookup for FixtureRegistry {
    async fn retrieve_asset(&self, asset_id: &str) -> Result<Option<Asset>, GatewayError> {
        Ok(self.assets.get(asset_id.trim()).cloned())
    }
}

#[async_trait]
impl TenureLookup for FixtureRegistry {
    async fn retrieve_tenure_type(
        &self,
        tenure_id: &str,
    ) -> Result<Option<TenureInformation>, GatewayError> {
        Ok(self.tenures.get(tenure_id.trim()).cloned())
    }
}

#[async_trait]
impl AlertsLookup for FixtureRegistry {
    async fn get_location_alerts(
        &self,
        property_reference: &str,
    ) -> Result<Option<AlertsBundle>, GatewayError> {
        let reference = property_reference.trim();
        Ok(Some(self.alerts.get(reference).cloned().unwrap_or_else(|| {
            AlertsBundle {
                alerts: Vec::new(),
                reference: Some(reference.to_string()),
            }
        })))
    }
}

fn normalize_postcode(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

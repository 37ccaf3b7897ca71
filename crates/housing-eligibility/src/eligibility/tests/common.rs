use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::eligibility::domain::{
    Alert, AlertsBundle, Asset, AssetManagement, AssetType, PropertyAddress, Reference,
    TenureInformation,
};
use crate::eligibility::gateways::{
    AddressLookup, AlertsLookup, AssetLookup, GatewayError, LookupGateways, TenureLookup,
};
use crate::eligibility::rules::EligibilityRuleSet;
use crate::eligibility::service::{EligibilityService, PipelineSettings};

pub(super) const PROPERTY_ID: &str = "01234567";
pub(super) const TENURE_ID: &str = "TEN001";

/// Dwelling, Flat, House with Introductory, Secure, Freehold tenures.
pub(super) fn rules() -> EligibilityRuleSet {
    EligibilityRuleSet::new(
        [AssetType::Flat, AssetType::House, AssetType::Dwelling],
        ["INT", "SEC", "FRE"],
    )
}

pub(super) fn eligible_asset() -> Asset {
    Asset {
        asset_id: Some(PROPERTY_ID.to_string()),
        asset_type: AssetType::Dwelling,
        management: Some(AssetManagement {
            is_tmo_managed: false,
        }),
        tenure_reference: Some(TENURE_ID.to_string()),
    }
}

pub(super) fn asset_with_tenure(asset_type: AssetType, tenure_id: &str) -> Asset {
    Asset {
        asset_id: None,
        asset_type,
        management: Some(AssetManagement {
            is_tmo_managed: false,
        }),
        tenure_reference: Some(tenure_id.to_string()),
    }
}

pub(super) fn secure_tenure() -> TenureInformation {
    TenureInformation::with_code("SEC")
}

pub(super) fn alerts(count: usize) -> AlertsBundle {
    AlertsBundle {
        alerts: (0..count)
            .map(|index| Alert {
                code: "VA".to_string(),
                description: Some(format!("Violent resident {index}")),
                start_date: None,
                end_date: None,
            })
            .collect(),
        reference: Some("TEST REFERENCE".to_string()),
    }
}

pub(super) fn address(asset_id: &str, postcode: &str) -> PropertyAddress {
    PropertyAddress {
        postal_code: Some(postcode.to_string()),
        building_number: None,
        address_line: vec![format!("{asset_id} Queensbridge Road")],
        city_name: Some("London".to_string()),
        reference: Some(Reference {
            id: asset_id.to_string(),
            allocated_by: Some("HousingSearchApi".to_string()),
            description: None,
        }),
    }
}

fn upstream_failure(service: &'static str) -> GatewayError {
    GatewayError::Status {
        service,
        status: 500,
    }
}

#[derive(Default)]
pub(super) struct StubAddresses {
    results: Vec<PropertyAddress>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubAddresses {
    pub(super) fn returning(results: Vec<PropertyAddress>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressLookup for StubAddresses {
    async fn search_by_postcode(
        &self,
        _postcode: &str,
    ) -> Result<Vec<PropertyAddress>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(upstream_failure("HousingSearch"));
        }
        Ok(self.results.clone())
    }
}

/// Unknown ids resolve to not found; ids in `failing` return an upstream error.
#[derive(Default)]
pub(super) struct StubAssets {
    assets: HashMap<String, Asset>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StubAssets {
    pub(super) fn with(mut self, asset_id: &str, asset: Asset) -> Self {
        self.assets.insert(asset_id.to_string(), asset);
        self
    }

    pub(super) fn failing_for(mut self, asset_id: &str) -> Self {
        self.failing.insert(asset_id.to_string());
        self
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetLookup for StubAssets {
    async fn retrieve_asset(&self, asset_id: &str) -> Result<Option<Asset>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(asset_id) {
            return Err(upstream_failure("Asset"));
        }
        Ok(self.assets.get(asset_id).cloned())
    }
}

#[derive(Default)]
pub(super) struct StubTenures {
    tenures: HashMap<String, TenureInformation>,
    calls: AtomicUsize,
}

impl StubTenures {
    pub(super) fn with(mut self, tenure_id: &str, tenure: TenureInformation) -> Self {
        self.tenures.insert(tenure_id.to_string(), tenure);
        self
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenureLookup for StubTenures {
    async fn retrieve_tenure_type(
        &self,
        tenure_id: &str,
    ) -> Result<Option<TenureInformation>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tenures.get(tenure_id).cloned())
    }
}

#[derive(Default)]
pub(super) struct StubAlerts {
    bundle: Option<AlertsBundle>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubAlerts {
    pub(super) fn none() -> Self {
        Self::returning(alerts(0))
    }

    pub(super) fn returning(bundle: AlertsBundle) -> Self {
        Self {
            bundle: Some(bundle),
            ..Self::default()
        }
    }

    pub(super) fn absent() -> Self {
        Self::default()
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertsLookup for StubAlerts {
    async fn get_location_alerts(
        &self,
        _property_reference: &str,
    ) -> Result<Option<AlertsBundle>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(upstream_failure("RepairsHubAlerts"));
        }
        Ok(self.bundle.clone())
    }
}

/// Asset lookup that never completes, for cancellation tests.
#[derive(Default)]
pub(super) struct HangingAssets {
    pub(super) started: AtomicUsize,
}

#[async_trait]
impl AssetLookup for HangingAssets {
    async fn retrieve_asset(&self, _asset_id: &str) -> Result<Option<Asset>, GatewayError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Eligible dwelling for every id, with a short pause so concurrent calls overlap.
#[derive(Default)]
pub(super) struct PeakTrackingAssets {
    in_flight: AtomicUsize,
    pub(super) peak: AtomicUsize,
}

#[async_trait]
impl AssetLookup for PeakTrackingAssets {
    async fn retrieve_asset(&self, asset_id: &str) -> Result<Option<Asset>, GatewayError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut asset = eligible_asset();
        asset.asset_id = Some(asset_id.to_string());
        Ok(Some(asset))
    }
}

pub(super) struct Stubs {
    pub(super) addresses: Arc<StubAddresses>,
    pub(super) assets: Arc<StubAssets>,
    pub(super) tenures: Arc<StubTenures>,
    pub(super) alerts: Arc<StubAlerts>,
}

impl Stubs {
    pub(super) fn new(
        addresses: StubAddresses,
        assets: StubAssets,
        tenures: StubTenures,
        alerts: StubAlerts,
    ) -> Self {
        Self {
            addresses: Arc::new(addresses),
            assets: Arc::new(assets),
            tenures: Arc::new(tenures),
            alerts: Arc::new(alerts),
        }
    }

    /// One eligible Dwelling with a Secure tenure and no alerts.
    pub(super) fn eligible_property() -> Self {
        Self::new(
            StubAddresses::returning(vec![address(PROPERTY_ID, "M3 OW")]),
            StubAssets::default().with(PROPERTY_ID, eligible_asset()),
            StubTenures::default().with(TENURE_ID, secure_tenure()),
            StubAlerts::none(),
        )
    }

    pub(super) fn gateways(&self) -> LookupGateways {
        LookupGateways {
            addresses: self.addresses.clone(),
            assets: self.assets.clone(),
            tenures: self.tenures.clone(),
            alerts: self.alerts.clone(),
        }
    }

    pub(super) fn service(&self) -> EligibilityService {
        EligibilityService::new(self.gateways(), rules(), PipelineSettings::default())
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::address_filter::AddressFilterPipeline;
use super::cancel::CancellationSignal;
use super::domain::{EligibilityVerdict, PropertyAddress};
use super::gateways::{GatewayError, LookupGateways};
use super::property_eligibility::PropertyEligibilityPipeline;
use super::rules::EligibilityRuleSet;

/// Fan-out bound and per-request deadline applied by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_concurrent_lookups: usize,
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 8,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Facade over the postcode search and the single-property check.
pub struct EligibilityService {
    addresses: AddressFilterPipeline,
    properties: PropertyEligibilityPipeline,
    request_timeout: Option<Duration>,
}

impl EligibilityService {
    pub fn new(
        gateways: LookupGateways,
        rules: EligibilityRuleSet,
        settings: PipelineSettings,
    ) -> Self {
        let rules = Arc::new(rules);
        let LookupGateways {
            addresses,
            assets,
            tenures,
            alerts,
        } = gateways;

        let address_pipeline = AddressFilterPipeline::new(
            addresses,
            Arc::clone(&assets),
            Arc::clone(&tenures),
            Arc::clone(&rules),
            settings.max_concurrent_lookups,
        );
        let property_pipeline = PropertyEligibilityPipeline::new(assets, tenures, alerts, rules);

        Self {
            addresses: address_pipeline,
            properties: property_pipeline,
            request_timeout: settings.request_timeout,
        }
    }

    /// Addresses for a postcode whose backing asset and tenure qualify.
    pub async fn search_addresses(
        &self,
        postcode: &str,
    ) -> Result<Vec<PropertyAddress>, EligibilityError> {
        self.search_addresses_with(postcode, &CancellationSignal::never())
            .await
    }

    pub async fn search_addresses_with(
        &self,
        postcode: &str,
        signal: &CancellationSignal,
    ) -> Result<Vec<PropertyAddress>, EligibilityError> {
        self.with_deadline(self.addresses.execute_with(postcode, signal))
            .await
    }

    /// Full eligibility verdict for one property.
    pub async fn verify_property(
        &self,
        property_id: &str,
    ) -> Result<EligibilityVerdict, EligibilityError> {
        self.verify_property_with(property_id, &CancellationSignal::never())
            .await
    }

    pub async fn verify_property_with(
        &self,
        property_id: &str,
        signal: &CancellationSignal,
    ) -> Result<EligibilityVerdict, EligibilityError> {
        self.with_deadline(self.properties.execute_with(property_id, signal))
            .await
    }

    async fn with_deadline<T, F>(&self, work: F) -> Result<T, EligibilityError>
    where
        F: Future<Output = Result<T, EligibilityError>>,
    {
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| EligibilityError::Cancelled)?,
            None => work.await,
        }
    }
}

/// Error raised by the eligibility pipelines.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("{0} must not be null or blank")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Upstream(#[from] GatewayError),
    #[error("eligibility lookup was cancelled before it completed")]
    Cancelled,
}

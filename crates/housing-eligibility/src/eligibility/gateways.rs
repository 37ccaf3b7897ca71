use std::sync::Arc;

use async_trait::async_trait;

use super::domain::{AlertsBundle, Asset, PropertyAddress, TenureInformation};

/// Resolves a postcode to candidate properties.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn search_by_postcode(&self, postcode: &str)
        -> Result<Vec<PropertyAddress>, GatewayError>;
}

/// Resolves an asset identifier. `Ok(None)` means the registry reported not found.
#[async_trait]
pub trait AssetLookup: Send + Sync {
    async fn retrieve_asset(&self, asset_id: &str) -> Result<Option<Asset>, GatewayError>;
}

#[async_trait]
pub trait TenureLookup: Send + Sync {
    async fn retrieve_tenure_type(
        &self,
        tenure_id: &str,
    ) -> Result<Option<TenureInformation>, GatewayError>;
}

#[async_trait]
pub trait AlertsLookup: Send + Sync {
    async fn get_location_alerts(
        &self,
        property_reference: &str,
    ) -> Result<Option<AlertsBundle>, GatewayError>;
}

/// The four upstream collaborators shared by both pipelines.
#[derive(Clone)]
pub struct LookupGateways {
    pub addresses: Arc<dyn AddressLookup>,
    pub assets: Arc<dyn AssetLookup>,
    pub tenures: Arc<dyn TenureLookup>,
    pub alerts: Arc<dyn AlertsLookup>,
}

/// Failure raised by an upstream collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{argument} must not be null or blank")]
    InvalidArgument { argument: &'static str },
    #[error("{service} API request failed with status code {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} API request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("{service} API returned an unreadable payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
    #[error("{service} API client is misconfigured: {message}")]
    Configuration {
        service: &'static str,
        message: String,
    },
}

pub(crate) fn require_argument<'a>(
    value: &'a str,
    argument: &'static str,
) -> Result<&'a str, GatewayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(GatewayError::InvalidArgument { argument })
    } else {
        Ok(trimmed)
    }
}

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::cancel::CancellationSignal;
use super::domain::PropertyAddress;
use super::evaluator::{check_listing, check_tenure, Ineligibility};
use super::gateways::{AddressLookup, AssetLookup, GatewayError, TenureLookup};
use super::rules::EligibilityRuleSet;
use super::service::EligibilityError;

/// Postcode search that only returns addresses whose asset and tenure qualify.
///
/// Candidates are screened concurrently, bounded by a semaphore shared across
/// requests. TMO and alert checks are left to the single-property path.
pub struct AddressFilterPipeline {
    addresses: Arc<dyn AddressLookup>,
    assets: Arc<dyn AssetLookup>,
    tenures: Arc<dyn TenureLookup>,
    rules: Arc<EligibilityRuleSet>,
    limiter: Arc<Semaphore>,
}

impl AddressFilterPipeline {
    pub fn new(
        addresses: Arc<dyn AddressLookup>,
        assets: Arc<dyn AssetLookup>,
        tenures: Arc<dyn TenureLookup>,
        rules: Arc<EligibilityRuleSet>,
        max_concurrent_lookups: usize,
    ) -> Self {
        Self {
            addresses,
            assets,
            tenures,
            rules,
            limiter: Arc::new(Semaphore::new(
                max_concurrent_lookups.clamp(1, Semaphore::MAX_PERMITS),
            )),
        }
    }

    pub async fn execute(&self, postcode: &str) -> Result<Vec<PropertyAddress>, EligibilityError> {
        self.execute_with(postcode, &CancellationSignal::never())
            .await
    }

    /// Blank postcodes yield an empty list without touching any upstream.
    pub async fn execute_with(
        &self,
        postcode: &str,
        signal: &CancellationSignal,
    ) -> Result<Vec<PropertyAddress>, EligibilityError> {
        if postcode.trim().is_empty() {
            info!("postcode was blank; returning no addresses");
            return Ok(Vec::new());
        }
        if signal.is_cancelled() {
            return Err(EligibilityError::Cancelled);
        }

        info!(%postcode, "searching addresses");
        let candidates = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(EligibilityError::Cancelled),
            result = self.addresses.search_by_postcode(postcode) => result?,
        };
        let candidate_count = candidates.len();

        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let Some(asset_id) = candidate.asset_id().map(str::to_owned) else {
                debug!(%postcode, "skipping address without an asset reference");
                continue;
            };

            let assets = Arc::clone(&self.assets);
            let tenures = Arc::clone(&self.tenures);
            let rules = Arc::clone(&self.rules);
            let limiter = Arc::clone(&self.limiter);
            let signal = signal.clone();

            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await.ok()?;
                if signal.is_cancelled() {
                    return None;
                }

                match screen_candidate(assets.as_ref(), tenures.as_ref(), &rules, &asset_id).await
                {
                    Ok(Ok(())) => Some(candidate),
                    Ok(Err(blocker)) => {
                        debug!(%asset_id, ?blocker, "address excluded");
                        None
                    }
                    Err(err) => {
                        warn!(%asset_id, error = %err, "address excluded after lookup failure");
                        None
                    }
                }
            });
        }

        let mut eligible = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    tasks.abort_all();
                    return Err(EligibilityError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Some(address))) => eligible.push(address),
                    Some(Ok(None)) => {}
                    Some(Err(err)) => warn!(error = %err, "address screening task failed"),
                },
            }
        }

        info!(
            %postcode,
            candidates = candidate_count,
            eligible = eligible.len(),
            "address search complete"
        );
        Ok(eligible)
    }
}

/// Asset before tenure; the tenure is only fetched for listable assets.
async fn screen_candidate(
    assets: &dyn AssetLookup,
    tenures: &dyn TenureLookup,
    rules: &EligibilityRuleSet,
    asset_id: &str,
) -> Result<Result<(), Ineligibility>, GatewayError> {
    let asset = assets.retrieve_asset(asset_id).await?;
    let tenure_id = match check_listing(asset.as_ref(), rules) {
        Ok(tenure_id) => tenure_id,
        Err(blocker) => return Ok(Err(blocker)),
    };

    let tenure = tenures.retrieve_tenure_type(tenure_id).await?;
    Ok(check_tenure(tenure.as_ref(), rules))
}

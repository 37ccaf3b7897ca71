use std::sync::Arc;

use tracing::{info, warn};

use super::cancel::CancellationSignal;
use super::domain::EligibilityVerdict;
use super::evaluator::{check_asset, check_tenure, evaluate, EvaluationInput};
use super::gateways::{AlertsLookup, AssetLookup, TenureLookup};
use super::rules::EligibilityRuleSet;
use super::service::EligibilityError;

/// Single-property eligibility check: asset, then tenure, then location alerts.
///
/// Each lookup is skipped once an earlier stage has already failed. The stage
/// checks are the evaluator's own, so the final reason always matches what
/// [`evaluate`] would return for the data collected so far.
pub struct PropertyEligibilityPipeline {
    assets: Arc<dyn AssetLookup>,
    tenures: Arc<dyn TenureLookup>,
    alerts: Arc<dyn AlertsLookup>,
    rules: Arc<EligibilityRuleSet>,
}

impl PropertyEligibilityPipeline {
    pub fn new(
        assets: Arc<dyn AssetLookup>,
        tenures: Arc<dyn TenureLookup>,
        alerts: Arc<dyn AlertsLookup>,
        rules: Arc<EligibilityRuleSet>,
    ) -> Self {
        Self {
            assets,
            tenures,
            alerts,
            rules,
        }
    }

    pub async fn execute(&self, property_id: &str) -> Result<EligibilityVerdict, EligibilityError> {
        self.execute_with(property_id, &CancellationSignal::never())
            .await
    }

    /// Like [`execute`](Self::execute), abandoning the pending lookup once
    /// `signal` fires.
    pub async fn execute_with(
        &self,
        property_id: &str,
        signal: &CancellationSignal,
    ) -> Result<EligibilityVerdict, EligibilityError> {
        let property_id = property_id.trim();
        if property_id.is_empty() {
            info!("property ID was blank; rejecting request");
            return Err(EligibilityError::InvalidInput("propertyId"));
        }
        if signal.is_cancelled() {
            return Err(EligibilityError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                info!(%property_id, "property check cancelled");
                Err(EligibilityError::Cancelled)
            }
            verdict = self.run(property_id) => verdict,
        }
    }

    async fn run(&self, property_id: &str) -> Result<EligibilityVerdict, EligibilityError> {
        info!(%property_id, "verifying property eligibility");
        let rules = self.rules.as_ref();

        let asset = self.assets.retrieve_asset(property_id).await?;
        let tenure_id = match check_asset(asset.as_ref(), rules) {
            Ok(tenure_id) => tenure_id,
            Err(_) => {
                return Ok(self.conclude(EvaluationInput {
                    property_id,
                    asset: asset.as_ref(),
                    tenure: None,
                    alerts: None,
                }))
            }
        };

        let tenure = self.tenures.retrieve_tenure_type(tenure_id).await?;
        if check_tenure(tenure.as_ref(), rules).is_err() {
            return Ok(self.conclude(EvaluationInput {
                property_id,
                asset: asset.as_ref(),
                tenure: tenure.as_ref(),
                alerts: None,
            }));
        }

        let alerts = self.alerts.get_location_alerts(property_id).await?;
        if alerts.is_none() {
            warn!(%property_id, "alerts registry returned no bundle; treating as zero alerts");
        }

        Ok(self.conclude(EvaluationInput {
            property_id,
            asset: asset.as_ref(),
            tenure: tenure.as_ref(),
            alerts: alerts.as_ref(),
        }))
    }

    fn conclude(&self, input: EvaluationInput<'_>) -> EligibilityVerdict {
        let verdict = evaluate(input, &self.rules);
        info!(
            property_id = %input.property_id,
            eligible = verdict.property_eligible,
            reason = %verdict.reason,
            "eligibility verdict"
        );
        verdict
    }
}

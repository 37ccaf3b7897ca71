//! Online repairs eligibility: upstream lookups, the decision rules, and the
//! two pipelines built on them.

pub mod address_filter;
pub mod batch;
pub mod cancel;
pub mod domain;
pub mod evaluator;
pub mod gateways;
pub mod http;
pub mod property_eligibility;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use address_filter::AddressFilterPipeline;
pub use batch::{check_batch, BatchError, BatchSummary};
pub use cancel::{cancellation, CancellationSignal, CancellationTrigger};
pub use domain::{
    Alert, AlertsBundle, Asset, AssetManagement, AssetType, EligibilityVerdict, PropertyAddress,
    Reference, TenureInformation, ELIGIBLE_REASON,
};
pub use evaluator::{evaluate, EvaluationInput, Ineligibility};
pub use gateways::{
    AddressLookup, AlertsLookup, AssetLookup, GatewayError, LookupGateways, TenureLookup,
};
pub use http::http_gateways;
pub use property_eligibility::PropertyEligibilityPipeline;
pub use router::eligibility_router;
pub use rules::EligibilityRuleSet;
pub use service::{EligibilityError, EligibilityService, PipelineSettings};

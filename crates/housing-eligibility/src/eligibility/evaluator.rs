use serde::{Deserialize, Serialize};

use super::domain::{AlertsBundle, Asset, AssetType, EligibilityVerdict, TenureInformation};
use super::rules::EligibilityRuleSet;

/// First check that failed for a property, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ineligibility {
    AssetNotFound,
    AssetTypeNotEligible(AssetType),
    NoValidTenure,
    MissingManagementInfo,
    TmoManaged,
    TenureTypeMissing,
    TenureTypeNotEligible(String),
    LocationAlerts(usize),
}

impl Ineligibility {
    pub fn summary(&self, property_id: &str) -> String {
        match self {
            Ineligibility::AssetNotFound => {
                format!("The asset with property ID {property_id} cannot be found")
            }
            Ineligibility::AssetTypeNotEligible(_) => {
                format!("The asset with {property_id} is not eligible because of the asset type")
            }
            Ineligibility::NoValidTenure => {
                format!("The asset with {property_id} has no valid tenure")
            }
            Ineligibility::MissingManagementInfo => {
                format!("Can't find TMO status for asset with property ID {property_id}")
            }
            Ineligibility::TmoManaged => {
                format!("The asset with property ID {property_id} is managed by a TMO")
            }
            Ineligibility::TenureTypeMissing => {
                format!("Tenure type code was null for asset with property ID {property_id}")
            }
            Ineligibility::TenureTypeNotEligible(_) => {
                format!("Tenure type for property {property_id} is not suitable for Online Repairs")
            }
            Ineligibility::LocationAlerts(count) => format!(
                "Property {property_id} is not eligible for Online Repairs due to having {count} active Location Alert(s)"
            ),
        }
    }

    pub fn into_verdict(self, property_id: &str) -> EligibilityVerdict {
        EligibilityVerdict::ineligible(self.summary(property_id))
    }
}

/// Everything known about one property when the decision is made.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInput<'a> {
    pub property_id: &'a str,
    pub asset: Option<&'a Asset>,
    pub tenure: Option<&'a TenureInformation>,
    /// `None` when the alerts registry returned nothing; treated as zero alerts.
    pub alerts: Option<&'a AlertsBundle>,
}

/// Applies every rule in order and stops at the first failure.
pub fn evaluate(input: EvaluationInput<'_>, rules: &EligibilityRuleSet) -> EligibilityVerdict {
    match check_all(input, rules) {
        Ok(()) => EligibilityVerdict::eligible(),
        Err(blocker) => blocker.into_verdict(input.property_id),
    }
}

fn check_all(input: EvaluationInput<'_>, rules: &EligibilityRuleSet) -> Result<(), Ineligibility> {
    check_asset(input.asset, rules)?;
    check_tenure(input.tenure, rules)?;
    check_alerts(input.alerts)
}

/// Asset presence, asset type and tenure reference. Shared with the postcode
/// search, which stops here before looking the tenure up.
pub fn check_listing<'a>(
    asset: Option<&'a Asset>,
    rules: &EligibilityRuleSet,
) -> Result<&'a str, Ineligibility> {
    let asset = asset.ok_or(Ineligibility::AssetNotFound)?;

    if !rules.admits_asset_type(asset.asset_type) {
        return Err(Ineligibility::AssetTypeNotEligible(asset.asset_type));
    }

    asset.tenure_id().ok_or(Ineligibility::NoValidTenure)
}

/// Listing checks followed by the TMO management checks. Returns the tenure
/// reference to look up next.
pub fn check_asset<'a>(
    asset: Option<&'a Asset>,
    rules: &EligibilityRuleSet,
) -> Result<&'a str, Ineligibility> {
    let tenure_id = check_listing(asset, rules)?;

    let management = asset
        .and_then(|asset| asset.management)
        .ok_or(Ineligibility::MissingManagementInfo)?;

    if management.is_tmo_managed {
        return Err(Ineligibility::TmoManaged);
    }

    Ok(tenure_id)
}

pub fn check_tenure(
    tenure: Option<&TenureInformation>,
    rules: &EligibilityRuleSet,
) -> Result<(), Ineligibility> {
    let code = tenure
        .and_then(TenureInformation::type_code)
        .ok_or(Ineligibility::TenureTypeMissing)?;

    if rules.admits_tenure_code(code) {
        Ok(())
    } else {
        Err(Ineligibility::TenureTypeNotEligible(code.to_string()))
    }
}

pub fn check_alerts(alerts: Option<&AlertsBundle>) -> Result<(), Ineligibility> {
    match alerts.map(AlertsBundle::active_count).unwrap_or(0) {
        0 => Ok(()),
        count => Err(Ineligibility::LocationAlerts(count)),
    }
}

use crate::infra::{FixtureRegistry, FIXTURE_POSTCODE};
use clap::Args;
use housing_eligibility::eligibility::{
    EligibilityRuleSet, EligibilityService, EligibilityVerdict, PipelineSettings, PropertyAddress,
};
use housing_eligibility::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Postcode to search in the fixture registry (defaults to the sample street).
    #[arg(long)]
    pub(crate) postcode: Option<String>,
    /// Only check these property IDs instead of every fixture property.
    #[arg(long = "property")]
    pub(crate) properties: Vec<String>,
}

/// Runs both pipelines against in-memory fixtures, no upstream access needed.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        postcode,
        properties,
    } = args;

    let registry = FixtureRegistry::sample();
    let properties = if properties.is_empty() {
        registry.property_ids()
    } else {
        properties
    };
    let rules = EligibilityRuleSet::standard();
    let service = EligibilityService::new(
        registry.into_gateways(),
        rules.clone(),
        PipelineSettings::default(),
    );

    println!("Online repairs eligibility demo");
    println!(
        "- Eligible asset types: {}",
        rules
            .asset_types()
            .map(|asset_type| asset_type.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "- Eligible tenure codes: {}",
        rules.tenure_codes().collect::<Vec<_>>().join(", ")
    );

    let postcode = postcode.unwrap_or_else(|| FIXTURE_POSTCODE.to_string());
    let addresses = service.search_addresses(&postcode).await?;
    println!(
        "\nAddress search for {postcode}: {} eligible address(es)",
        addresses.len()
    );
    for address in &addresses {
        println!("  - {}", describe_address(address));
    }

    println!("\nProperty checks");
    let mut eligible = 0;
    for property_id in &properties {
        match service.verify_property(property_id).await {
            Ok(verdict) => {
                if verdict.property_eligible {
                    eligible += 1;
                }
                println!("  - {}", describe_verdict(property_id, &verdict));
            }
            Err(err) => println!("  - {property_id}: check failed ({err})"),
        }
    }
    println!("{eligible} of {} properties eligible", properties.len());

    Ok(())
}

pub(crate) fn describe_address(address: &PropertyAddress) -> String {
    let reference = address.asset_id().unwrap_or("unreferenced");
    let lines = address.address_line.join(", ");
    match address.postal_code.as_deref() {
        Some(postcode) => format!("[{reference}] {lines}, {postcode}"),
        None => format!("[{reference}] {lines}"),
    }
}

pub(crate) fn describe_verdict(property_id: &str, verdict: &EligibilityVerdict) -> String {
    let label = if verdict.property_eligible {
        "eligible"
    } else {
        "ineligible"
    };
    format!("{property_id}: {label} ({})", verdict.reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use housing_eligibility::eligibility::Reference;

    #[tokio::test]
    async fn demo_runs_against_fixtures() {
        run_demo(DemoArgs::default()).await.expect("demo completes");
    }

    #[test]
    fn address_description_includes_reference_and_postcode() {
        let address = PropertyAddress {
            postal_code: Some("E8 1DY".to_string()),
            address_line: vec!["1 Queensbridge Road".to_string()],
            reference: Some(Reference {
                id: "00023400".to_string(),
                allocated_by: None,
                description: None,
            }),
            ..PropertyAddress::default()
        };

        assert_eq!(
            describe_address(&address),
            "[00023400] 1 Queensbridge Road, E8 1DY"
        );
    }

    #[test]
    fn verdict_description_labels_outcome() {
        let verdict = EligibilityVerdict::ineligible("The asset with property ID 1 cannot be found");
        assert_eq!(
            describe_verdict("1", &verdict),
            "1: ineligible (The asset with property ID 1 cannot be found)"
        );
    }
}

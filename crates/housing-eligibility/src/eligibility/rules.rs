use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::AssetType;

/// Asset types and tenure type codes admitted to the online repairs channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRuleSet {
    asset_types: BTreeSet<AssetType>,
    tenure_codes: BTreeSet<String>,
}

impl EligibilityRuleSet {
    pub fn new<A, T, S>(asset_types: A, tenure_codes: T) -> Self
    where
        A: IntoIterator<Item = AssetType>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            asset_types: asset_types.into_iter().collect(),
            tenure_codes: tenure_codes
                .into_iter()
                .map(|code| code.into().trim().to_ascii_uppercase())
                .filter(|code| !code.is_empty())
                .collect(),
        }
    }

    /// Flat, House, Dwelling, StudioFlat, SelfContainedBedsit with Introductory
    /// or Secure tenures.
    pub fn standard() -> Self {
        Self::new(
            [
                AssetType::Flat,
                AssetType::House,
                AssetType::Dwelling,
                AssetType::StudioFlat,
                AssetType::SelfContainedBedsit,
            ],
            ["INT", "SEC"],
        )
    }

    pub fn admits_asset_type(&self, asset_type: AssetType) -> bool {
        self.asset_types.contains(&asset_type)
    }

    pub fn admits_tenure_code(&self, code: &str) -> bool {
        self.tenure_codes
            .contains(code.trim().to_ascii_uppercase().as_str())
    }

    pub fn asset_types(&self) -> impl Iterator<Item = AssetType> + '_ {
        self.asset_types.iter().copied()
    }

    pub fn tenure_codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.tenure_codes.iter().map(String::as_str)
    }
}

impl Default for EligibilityRuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pointer from an address record to the asset that backs it in another system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Candidate property returned by a postcode search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAddress {
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_number: Option<String>,
    #[serde(default)]
    pub address_line: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    pub reference: Option<Reference>,
}

impl PropertyAddress {
    /// Asset identifier usable for follow-up lookups, if the address carries one.
    pub fn asset_id(&self) -> Option<&str> {
        self.reference
            .as_ref()
            .map(|reference| reference.id.trim())
            .filter(|id| !id.is_empty())
    }
}

/// Asset classification reported by the asset registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetType {
    Block,
    Concierge,
    Dwelling,
    Estate,
    Flat,
    HighRiseBlock,
    House,
    LettableNonDwelling,
    LowRiseBlock,
    MediumRiseBlock,
    SelfContainedBedsit,
    StudioFlat,
    TerracedBlock,
    TravellerSite,
    WalkUpBlock,
    #[serde(other)]
    Other,
}

impl AssetType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Block => "Block",
            Self::Concierge => "Concierge",
            Self::Dwelling => "Dwelling",
            Self::Estate => "Estate",
            Self::Flat => "Flat",
            Self::HighRiseBlock => "HighRiseBlock",
            Self::House => "House",
            Self::LettableNonDwelling => "LettableNonDwelling",
            Self::LowRiseBlock => "LowRiseBlock",
            Self::MediumRiseBlock => "MediumRiseBlock",
            Self::SelfContainedBedsit => "SelfContainedBedsit",
            Self::StudioFlat => "StudioFlat",
            Self::TerracedBlock => "TerracedBlock",
            Self::TravellerSite => "TravellerSite",
            Self::WalkUpBlock => "WalkUpBlock",
            Self::Other => "Other",
        }
    }

    pub const fn all() -> [Self; 16] {
        [
            Self::Block,
            Self::Concierge,
            Self::Dwelling,
            Self::Estate,
            Self::Flat,
            Self::HighRiseBlock,
            Self::House,
            Self::LettableNonDwelling,
            Self::LowRiseBlock,
            Self::MediumRiseBlock,
            Self::SelfContainedBedsit,
            Self::StudioFlat,
            Self::TerracedBlock,
            Self::TravellerSite,
            Self::WalkUpBlock,
            Self::Other,
        ]
    }

    /// Case-insensitive lookup by registry label. `Other` is the catch-all for
    /// unrecognised payloads and never matches a label.
    pub fn from_label(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all()
            .into_iter()
            .filter(|candidate| *candidate != Self::Other)
            .find(|candidate| candidate.label().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManagement {
    pub is_tmo_managed: bool,
}

/// Asset registry record for a single property.
///
/// `management` being `None` means the registry did not report management
/// information at all, which is not the same as `is_tmo_managed == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: Option<String>,
    pub asset_type: AssetType,
    pub management: Option<AssetManagement>,
    pub tenure_reference: Option<String>,
}

impl Asset {
    pub fn tenure_id(&self) -> Option<&str> {
        self.tenure_reference
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenureInformation {
    pub tenure_type_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenure_type_description: Option<String>,
}

impl TenureInformation {
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            tenure_type_code: Some(code.into()),
            tenure_type_description: None,
        }
    }

    pub fn type_code(&self) -> Option<&str> {
        self.tenure_type_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub code: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Active location alerts for one property. An empty list means no alerts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertsBundle {
    pub alerts: Vec<Alert>,
    pub reference: Option<String>,
}

impl AlertsBundle {
    pub fn active_count(&self) -> usize {
        self.alerts.len()
    }
}

/// Final decision surfaced to callers. `reason` is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityVerdict {
    pub property_eligible: bool,
    pub reason: String,
}

pub const ELIGIBLE_REASON: &str = "The property is valid";

impl EligibilityVerdict {
    pub fn eligible() -> Self {
        Self {
            property_eligible: true,
            reason: ELIGIBLE_REASON.to_string(),
        }
    }

    pub fn ineligible(reason: impl Into<String>) -> Self {
        Self {
            property_eligible: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_ignores_blank_references() {
        let mut address = PropertyAddress {
            reference: Some(Reference {
                id: "   ".to_string(),
                allocated_by: None,
                description: None,
            }),
            ..PropertyAddress::default()
        };
        assert!(address.asset_id().is_none());

        address.reference = None;
        assert!(address.asset_id().is_none());
    }

    #[test]
    fn asset_type_labels_parse_case_insensitively() {
        assert_eq!(AssetType::from_label("dwelling"), Some(AssetType::Dwelling));
        assert_eq!(
            AssetType::from_label(" SelfContainedBedsit "),
            Some(AssetType::SelfContainedBedsit)
        );
        assert_eq!(AssetType::from_label("Castle"), None);
    }

    #[test]
    fn catch_all_has_no_label() {
        assert_eq!(AssetType::from_label("Other"), None);
        assert_eq!(AssetType::from_label("other"), None);
    }

    #[test]
    fn unknown_asset_types_deserialize_as_other() {
        let parsed: AssetType = serde_json::from_str("\"Lighthouse\"").expect("deserializes");
        assert_eq!(parsed, AssetType::Other);
    }
}

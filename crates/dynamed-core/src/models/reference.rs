//! Reference-data kinds and items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The flat, name-only reference entities a molecule or consultation links to.
///
/// Every create/search operation on reference data is resolved by matching on
/// this enum; there is no string-keyed model dispatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Patient allergy (contraindication)
    Allergy,
    /// Medical history item (contraindication)
    MedicalHistory,
    /// Medication the patient already takes (contraindication)
    CurrentMedication,
    /// Indication (scores +2 per match)
    Indication,
    /// Precaution (scores -1 per match)
    Precaution,
    /// Therapeutic class linking diagnoses to molecules
    MedicalClass,
}

impl ReferenceKind {
    /// All kinds, in storage order.
    pub const ALL: [ReferenceKind; 6] = [
        ReferenceKind::Allergy,
        ReferenceKind::MedicalHistory,
        ReferenceKind::CurrentMedication,
        ReferenceKind::Indication,
        ReferenceKind::Precaution,
        ReferenceKind::MedicalClass,
    ];

    /// Kinds a consultation records as clinical inputs.
    pub const CLINICAL_INPUTS: [ReferenceKind; 5] = [
        ReferenceKind::Allergy,
        ReferenceKind::MedicalHistory,
        ReferenceKind::CurrentMedication,
        ReferenceKind::Indication,
        ReferenceKind::Precaution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allergy => "allergy",
            Self::MedicalHistory => "medical_history",
            Self::CurrentMedication => "current_medication",
            Self::Indication => "indication",
            Self::Precaution => "precaution",
            Self::MedicalClass => "medical_class",
        }
    }

    /// Whether a match on this kind disqualifies a molecule outright.
    pub fn is_contraindication(&self) -> bool {
        matches!(
            self,
            Self::Allergy | Self::MedicalHistory | Self::CurrentMedication
        )
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown reference kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown reference kind: {0}")]
pub struct UnknownReferenceKind(pub String);

impl FromStr for ReferenceKind {
    type Err = UnknownReferenceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allergy" => Ok(Self::Allergy),
            "medical_history" => Ok(Self::MedicalHistory),
            "current_medication" => Ok(Self::CurrentMedication),
            "indication" => Ok(Self::Indication),
            "precaution" => Ok(Self::Precaution),
            "medical_class" => Ok(Self::MedicalClass),
            other => Err(UnknownReferenceKind(other.to_string())),
        }
    }
}

/// A single reference-data record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceItem {
    /// Store-assigned ID
    pub id: i64,
    /// Which reference entity this is
    pub kind: ReferenceKind,
    /// Display name, matched case-insensitively during scoring
    pub name: String,
    /// Free-text description (symptoms, reactions, ...)
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ReferenceKind::ALL {
            assert_eq!(kind.as_str().parse::<ReferenceKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "age_category".parse::<ReferenceKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown reference kind: age_category");
    }

    #[test]
    fn test_contraindication_kinds() {
        assert!(ReferenceKind::Allergy.is_contraindication());
        assert!(ReferenceKind::CurrentMedication.is_contraindication());
        assert!(!ReferenceKind::Indication.is_contraindication());
        assert!(!ReferenceKind::MedicalClass.is_contraindication());
    }
}

//! Recommendation models produced by the molecule scorer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::molecule::Molecule;

/// A recommended molecule with its score and display summaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMolecule {
    pub molecule_id: i64,
    pub name: String,
    /// +2 per matching indication, -1 per matching precaution (by default)
    pub score: i32,
    /// Comma-separated indications of the molecule
    pub indications: String,
    /// Comma-separated precautions of the molecule
    pub precautions: String,
    pub side_effects: String,
    /// Comma-separated brand names
    pub commercial_names: String,
    /// Comma-separated therapeutic classes
    pub medical_classes: String,
}

impl ScoredMolecule {
    /// Render the summaries of `molecule` alongside its score.
    pub fn from_molecule(molecule: &Molecule, score: i32) -> Self {
        Self {
            molecule_id: molecule.id,
            name: molecule.name.clone(),
            score,
            indications: molecule.indications.join(", "),
            precautions: molecule.precautions.join(", "),
            side_effects: molecule.major_side_effects.clone().unwrap_or_default(),
            commercial_names: molecule
                .commercial_names
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            medical_classes: molecule.medical_classes.join(", "),
        }
    }
}

/// Why a candidate molecule was disqualified before scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Contraindication {
    /// Patient allergy listed on the molecule
    Allergy(String),
    /// Medical history item listed on the molecule
    MedicalHistory(String),
    /// Current medication listed on the molecule
    CurrentMedication(String),
    /// Patient is pregnant and the molecule is pregnancy-unsafe
    Pregnancy,
    /// Patient is breastfeeding and the molecule is breastfeeding-unsafe
    Breastfeeding,
}

impl fmt::Display for Contraindication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allergy(name) => write!(f, "allergy: {}", name),
            Self::MedicalHistory(name) => write!(f, "medical history: {}", name),
            Self::CurrentMedication(name) => write!(f, "current medication: {}", name),
            Self::Pregnancy => f.write_str("pregnancy"),
            Self::Breastfeeding => f.write_str("breastfeeding"),
        }
    }
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Disqualified; no score was computed
    Excluded(Contraindication),
    /// Scored; recommendable only above the configured threshold
    Scored(i32),
}

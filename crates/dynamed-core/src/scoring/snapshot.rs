//! Input fingerprints for recommendation snapshots.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::ScoringWeights;
use crate::models::ClinicalInputBundle;

/// Order-independent view of everything a ranking depends on.
#[derive(Serialize)]
struct CanonicalInputs<'a> {
    reference_revision: i64,
    weights: &'a ScoringWeights,
    diagnoses: Vec<i64>,
    medical_classes: Vec<i64>,
    indications: Vec<String>,
    allergies: Vec<String>,
    medical_history: Vec<String>,
    current_medications: Vec<String>,
    precautions: Vec<String>,
    pregnant: bool,
    breastfeeding: bool,
}

fn canonical_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    out.sort();
    out
}

/// SHA-256 (hex) of the inputs, the weights and the reference revision.
///
/// Two bundles that rank identically against the same reference data share a
/// fingerprint, whatever order their entries were selected in.
pub fn fingerprint(
    bundle: &ClinicalInputBundle,
    weights: &ScoringWeights,
    reference_revision: i64,
) -> Result<String, serde_json::Error> {
    let mut diagnoses: Vec<i64> = bundle.diagnoses.iter().map(|d| d.id).collect();
    diagnoses.sort_unstable();

    let canonical = CanonicalInputs {
        reference_revision,
        weights,
        diagnoses,
        medical_classes: bundle.medical_class_ids(),
        indications: canonical_names(&bundle.indications),
        allergies: canonical_names(&bundle.allergies),
        medical_history: canonical_names(&bundle.medical_history),
        current_medications: canonical_names(&bundle.current_medications),
        precautions: canonical_names(&bundle.precautions),
        pregnant: bundle.pregnant,
        breastfeeding: bundle.breastfeeding,
    };

    let bytes = serde_json::to_vec(&canonical)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

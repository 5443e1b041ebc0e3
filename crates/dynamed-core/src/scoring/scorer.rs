//! Contraindication filtering and indication/precaution scoring.
//!
//! Candidates go through a fixed sequence:
//! - exclusion checks, first hit wins: allergy, medical history, current
//!   medication, pregnancy, breastfeeding
//! - score: `+indication_match` per bundle indication the molecule treats,
//!   `-precaution_match` per bundle precaution it carries
//! - threshold: keep `score > min_score`
//! - stable sort by score, best first
//!
//! Name comparisons are case-insensitive.

use std::collections::HashSet;

use crate::config::ScoringWeights;
use crate::models::{ClinicalInputBundle, Contraindication, Evaluation, Molecule, ScoredMolecule};

use super::{ScoringError, ScoringResult};

/// Medical classes of the selected diagnoses. Fails when there are none.
pub fn derive_medical_classes(bundle: &ClinicalInputBundle) -> ScoringResult<Vec<i64>> {
    let classes = bundle.medical_class_ids();
    if classes.is_empty() {
        return Err(ScoringError::NoMedicalClass);
    }
    Ok(classes)
}

/// First reason `molecule` must not be recommended for these inputs.
pub fn contraindication(bundle: &ClinicalInputBundle, molecule: &Molecule) -> Option<Contraindication> {
    if let Some(name) = first_match(&bundle.allergies, &molecule.allergies) {
        return Some(Contraindication::Allergy(name.clone()));
    }
    if let Some(name) = first_match(&bundle.medical_history, &molecule.medical_history) {
        return Some(Contraindication::MedicalHistory(name.clone()));
    }
    if let Some(name) = first_match(&bundle.current_medications, &molecule.current_medications) {
        return Some(Contraindication::CurrentMedication(name.clone()));
    }
    if bundle.pregnant && molecule.pregnancy_unsafe {
        return Some(Contraindication::Pregnancy);
    }
    if bundle.breastfeeding && molecule.breastfeeding_unsafe {
        return Some(Contraindication::Breastfeeding);
    }
    None
}

/// Exclude or score a single candidate.
pub fn evaluate_candidate(
    bundle: &ClinicalInputBundle,
    molecule: &Molecule,
    weights: &ScoringWeights,
) -> Evaluation {
    if let Some(reason) = contraindication(bundle, molecule) {
        return Evaluation::Excluded(reason);
    }

    let indications = count_matches(&bundle.indications, &molecule.indications);
    let precautions = count_matches(&bundle.precautions, &molecule.precautions);
    // Large configured weights clamp at the i32 bounds
    let gained = indications.saturating_mul(weights.indication_match);
    let lost = precautions.saturating_mul(weights.precaution_match);
    Evaluation::Scored(gained.saturating_sub(lost))
}

/// Rank a candidate pool. Ties keep pool order.
pub fn score_candidates(
    bundle: &ClinicalInputBundle,
    candidates: &[Molecule],
    weights: &ScoringWeights,
) -> Vec<ScoredMolecule> {
    let mut scored = Vec::new();

    for molecule in candidates {
        match evaluate_candidate(bundle, molecule, weights) {
            Evaluation::Excluded(reason) => {
                tracing::debug!(molecule = %molecule.name, %reason, "candidate excluded");
            }
            Evaluation::Scored(score) if score > weights.min_score => {
                scored.push(ScoredMolecule::from_molecule(molecule, score));
            }
            Evaluation::Scored(score) => {
                tracing::debug!(molecule = %molecule.name, score, "candidate below threshold");
            }
        }
    }

    // sort_by is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

fn lowercase_set(names: &[String]) -> HashSet<String> {
    names.iter().map(|n| n.to_lowercase()).collect()
}

fn first_match<'a>(selected: &'a [String], listed: &[String]) -> Option<&'a String> {
    if selected.is_empty() || listed.is_empty() {
        return None;
    }
    let listed = lowercase_set(listed);
    selected.iter().find(|s| listed.contains(&s.to_lowercase()))
}

fn count_matches(selected: &[String], listed: &[String]) -> i32 {
    if selected.is_empty() || listed.is_empty() {
        return 0;
    }
    let listed = lowercase_set(listed);
    selected
        .iter()
        .filter(|s| listed.contains(&s.to_lowercase()))
        .count() as i32
}

//! Molecule recommendation for consultations.
//!
//! Pipeline: Clinical inputs → Medical classes → Candidate pool → Exclusion
//! → Scoring → Ranked list → Snapshot

mod scorer;
mod snapshot;

pub use scorer::*;
pub use snapshot::*;

use crate::config::ScoringWeights;
use crate::db::Database;
use crate::models::{ClinicalInputBundle, MoleculeSnapshot, ScoredMolecule};
use thiserror::Error;

/// Scoring errors.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Fingerprint error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Select at least one diagnosis with an associated medical class")]
    NoMedicalClass,
}

pub type ScoringResult<T> = Result<T, ScoringError>;

/// Ranks molecules for stored consultations and keeps their snapshots.
pub struct Scorer<'a> {
    db: &'a Database,
    weights: ScoringWeights,
}

impl<'a> Scorer<'a> {
    /// Create a new scorer.
    pub fn new(db: &'a Database, weights: ScoringWeights) -> Self {
        Self { db, weights }
    }

    /// Rank the molecules for a consultation and store the result as its
    /// snapshot, replacing any previous one.
    pub fn score(&self, consultation_id: &str) -> ScoringResult<Vec<ScoredMolecule>> {
        let bundle = self.db.load_input_bundle(consultation_id)?;
        let fingerprint = self.fingerprint(&bundle)?;
        let (ranked, _) = self.score_bundle(consultation_id, &bundle, fingerprint)?;
        Ok(ranked)
    }

    /// Rank a bundle without touching any snapshot.
    pub fn rank(&self, bundle: &ClinicalInputBundle) -> ScoringResult<Vec<ScoredMolecule>> {
        let classes = derive_medical_classes(bundle)?;
        let pool = self.db.molecules_in_classes(&classes)?;
        tracing::debug!(
            classes = classes.len(),
            pool = pool.len(),
            "candidate pool loaded"
        );
        Ok(score_candidates(bundle, &pool, &self.weights))
    }

    /// The consultation's snapshot, recomputed first when missing or stale.
    pub fn current_snapshot(&self, consultation_id: &str) -> ScoringResult<MoleculeSnapshot> {
        let bundle = self.db.load_input_bundle(consultation_id)?;
        let fingerprint = self.fingerprint(&bundle)?;

        match self.db.get_snapshot(consultation_id)? {
            Some(snapshot) if snapshot.is_current(&fingerprint) => return Ok(snapshot),
            Some(_) => tracing::debug!(consultation_id, "snapshot stale, recomputing"),
            None => tracing::debug!(consultation_id, "no snapshot, computing"),
        }

        let (_, snapshot) = self.score_bundle(consultation_id, &bundle, fingerprint)?;
        Ok(snapshot)
    }

    fn fingerprint(&self, bundle: &ClinicalInputBundle) -> ScoringResult<String> {
        let revision = self.db.reference_revision()?;
        Ok(fingerprint(bundle, &self.weights, revision)?)
    }

    fn score_bundle(
        &self,
        consultation_id: &str,
        bundle: &ClinicalInputBundle,
        fingerprint: String,
    ) -> ScoringResult<(Vec<ScoredMolecule>, MoleculeSnapshot)> {
        let ranked = self.rank(bundle)?;

        let snapshot = MoleculeSnapshot {
            consultation_id: consultation_id.to_string(),
            molecule_ids: ranked.iter().map(|s| s.molecule_id).collect(),
            fingerprint,
            computed_at: chrono::Utc::now().to_rfc3339(),
        };
        self.db.put_snapshot(&snapshot)?;

        tracing::info!(
            consultation_id,
            recommended = ranked.len(),
            "recommendations computed"
        );
        Ok((ranked, snapshot))
    }
}

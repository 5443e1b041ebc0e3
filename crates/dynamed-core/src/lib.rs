//! DynaMed Core Library
//!
//! Consultation-time decision support: molecule recommendation and
//! drug-interaction gating for prescriptions.
//!
//! # Architecture
//!
//! ```text
//!   Reference data (import)          Consultation inputs
//!             │                               │
//!             ▼                               ▼
//!   ┌──────────────────┐           ┌─────────────────────┐
//!   │  Reference store │──────────▶│ ClinicalInputBundle │
//!   └──────────────────┘           └──────────┬──────────┘
//!             │                               │
//!             │                               ▼
//!             │                     ┌──────────────────┐
//!             │                     │  Molecule scorer │
//!             │                     └────────┬─────────┘
//!             │                              │
//!             │                  [SNAPSHOT: molecule_snapshots]
//!             │                              │
//!             │                              ▼
//!             │                   ┌─────────────────────┐
//!             └──────────────────▶│ Prescription builder│◀── Interaction gate
//!                                 └──────────┬──────────┘
//!                                            │
//!                              ┌─────────────┴─────────────┐
//!                              ▼                           ▼
//!                     Recommendation report      Prescription document
//! ```
//!
//! # Core Principle
//!
//! **No line is ever persisted next to a molecule it interacts with.** The
//! interaction check and the insert share one transaction.
//!
//! # Modules
//!
//! - [`db`]: SQLite store for reference data, consultations and prescriptions
//! - [`models`]: Domain types (Molecule, Consultation, Prescription, etc.)
//! - [`scoring`]: Molecule scorer and recommendation snapshots
//! - [`interactions`]: Interaction checker
//! - [`prescription`]: Prescription line builder
//! - [`import`]: Reference-data population
//! - [`export`]: Recommendation and prescription documents
//! - [`config`]: Engine configuration

pub mod config;
pub mod db;
pub mod export;
pub mod import;
pub mod interactions;
pub mod models;
pub mod prescription;
pub mod scoring;

// Re-export commonly used types
pub use config::{ConflictPolicy, EngineConfig, ScoringWeights};
pub use db::Database;
pub use export::{PrescriptionDocument, PrescriptionExporter, RecommendationReport};
pub use import::{CommercialNameRecord, InteractionRecord, MoleculeRecord, ReferenceImporter};
pub use interactions::{BlockingConflict, Conflict, InteractionIndex, InteractionLookup};
pub use models::{
    ClinicalInputBundle, ClinicalSelection, Consultation, GeneratedPrescription, Molecule,
    MoleculeRef, Prescription, PrescriptionLine, ReferenceKind, ScoredMolecule, SkippedMolecule,
};
pub use prescription::{PrescriptionBuilder, PrescriptionError};
pub use scoring::{Scorer, ScoringError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DynamedError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("No medical class can be derived from the selected diagnoses")]
    NoMedicalClass,

    #[error("No valid molecules to prescribe")]
    NoValidMolecules,

    #[error("{0}")]
    BlockingConflict(String),
}

impl From<db::DbError> for DynamedError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => DynamedError::NotFound(what),
            db::DbError::Constraint(msg) => DynamedError::InvalidInput(msg),
            other => DynamedError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DynamedError {
    fn from(e: serde_json::Error) -> Self {
        DynamedError::SerializationError(e.to_string())
    }
}

impl From<ScoringError> for DynamedError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::Database(e) => e.into(),
            ScoringError::Json(e) => e.into(),
            ScoringError::NoMedicalClass => DynamedError::NoMedicalClass,
        }
    }
}

impl From<PrescriptionError> for DynamedError {
    fn from(e: PrescriptionError) -> Self {
        match e {
            PrescriptionError::Database(e) => e.into(),
            PrescriptionError::Scoring(e) => e.into(),
            PrescriptionError::NoValidMolecules => DynamedError::NoValidMolecules,
            PrescriptionError::BlockingConflict(b) => DynamedError::BlockingConflict(b.to_string()),
            PrescriptionError::NotFound(what) => DynamedError::NotFound(what),
            PrescriptionError::InvalidInput(msg) => DynamedError::InvalidInput(msg),
        }
    }
}

impl From<config::ConfigError> for DynamedError {
    fn from(e: config::ConfigError) -> Self {
        match e {
            config::ConfigError::Json(e) => e.into(),
            other => DynamedError::InvalidInput(other.to_string()),
        }
    }
}

impl From<models::UnknownReferenceKind> for DynamedError {
    fn from(e: models::UnknownReferenceKind) -> Self {
        DynamedError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DynamedError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DynamedError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a `tracing` subscriber. `RUST_LOG` wins over `filter`, which
/// defaults to the crate's info level. Returns false when a subscriber is
/// already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    let fallback = filter.unwrap_or_else(|| config::default_log_filter().to_string());
    install_subscriber(EnvFilter::new(fallback))
}

fn install_subscriber(fallback: EnvFilter) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(fallback))
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(app = config::APP_NAME, version = config::APP_VERSION, "logging initialised");
    }
    installed
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DynamedCore>, DynamedError> {
    let db = Database::open(&path)?;
    Ok(DynamedCore::new(db, EngineConfig::default()))
}

/// Open or create a database with a JSON engine configuration.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<DynamedCore>, DynamedError> {
    let config = EngineConfig::from_json(&config_json)?;
    let db = Database::open(&path)?;
    Ok(DynamedCore::new(db, config))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DynamedCore>, DynamedError> {
    let db = Database::open_in_memory()?;
    Ok(DynamedCore::new(db, EngineConfig::default()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DynamedCore {
    db: Arc<Mutex<Database>>,
    config: EngineConfig,
}

impl DynamedCore {
    /// Wrap an open database. Also usable from Rust for non-default configs.
    pub fn new(db: Database, config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[uniffi::export]
impl DynamedCore {
    /// Install a `tracing` subscriber filtered by the configured
    /// `log_filter`. `RUST_LOG` still wins. Returns false when a subscriber
    /// is already installed.
    pub fn init_logging(&self) -> Result<bool, DynamedError> {
        Ok(install_subscriber(self.config.env_filter()?))
    }

    // =========================================================================
    // Consultation Operations
    // =========================================================================

    /// Create a consultation with its clinical inputs.
    pub fn create_consultation(
        &self,
        patient_ref: Option<String>,
        selection: FfiClinicalSelection,
    ) -> Result<FfiConsultation, DynamedError> {
        let db = self.db.lock()?;
        let mut consultation = Consultation::new(patient_ref);
        consultation.selection = selection.into();
        db.insert_consultation(&consultation)?;
        Ok(consultation.into())
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, id: String) -> Result<Option<FfiConsultation>, DynamedError> {
        let db = self.db.lock()?;
        let consultation = db.get_consultation(&id)?;
        Ok(consultation.map(|c| c.into()))
    }

    /// Replace a consultation's clinical inputs. Its snapshot is dropped.
    pub fn set_consultation_inputs(
        &self,
        id: String,
        selection: FfiClinicalSelection,
    ) -> Result<(), DynamedError> {
        let db = self.db.lock()?;
        if !db.update_selection(&id, &selection.into())? {
            return Err(DynamedError::NotFound(format!("consultation {}", id)));
        }
        Ok(())
    }

    /// Delete a consultation with its snapshot and prescriptions.
    pub fn delete_consultation(&self, id: String) -> Result<bool, DynamedError> {
        let db = self.db.lock()?;
        Ok(db.delete_consultation(&id)?)
    }

    // =========================================================================
    // Scoring Operations
    // =========================================================================

    /// Rank the recommended molecules for a consultation, best first.
    pub fn score_consultation(
        &self,
        consultation_id: String,
    ) -> Result<Vec<FfiScoredMolecule>, DynamedError> {
        let db = self.db.lock()?;
        let ranked = Scorer::new(&db, self.config.scoring).score(&consultation_id)?;
        Ok(ranked.into_iter().map(|m| m.into()).collect())
    }

    /// The consultation's current recommendations, from its snapshot.
    pub fn get_valid_molecules(
        &self,
        consultation_id: String,
    ) -> Result<Vec<FfiMoleculeRef>, DynamedError> {
        let db = self.db.lock()?;
        let snapshot = Scorer::new(&db, self.config.scoring).current_snapshot(&consultation_id)?;
        let refs = db.molecule_refs(&snapshot.molecule_ids)?;
        Ok(refs.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Interaction Operations
    // =========================================================================

    /// Interactions between a candidate and already-selected molecules.
    pub fn check_interactions(
        &self,
        candidate_id: i64,
        existing_ids: Vec<i64>,
    ) -> Result<Vec<FfiConflict>, DynamedError> {
        let db = self.db.lock()?;
        let candidate = db
            .molecule_refs(&[candidate_id])?
            .pop()
            .ok_or_else(|| DynamedError::NotFound(format!("molecule {}", candidate_id)))?;
        let existing = db.molecule_refs(&existing_ids)?;
        let conflicts = interactions::find_conflicts(&*db, &candidate, &existing)?;
        Ok(conflicts.into_vec().into_iter().map(|c| c.into()).collect())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    /// Build a prescription from the consultation's recommendations.
    pub fn generate_prescription(
        &self,
        consultation_id: String,
    ) -> Result<FfiGeneratedPrescription, DynamedError> {
        let db = self.db.lock()?;
        let builder = PrescriptionBuilder::new(&db, &self.config);
        Ok(builder.generate_prescription(&consultation_id)?.into())
    }

    /// Append a molecule to a prescription.
    pub fn add_line(
        &self,
        prescription_id: String,
        molecule_id: i64,
        commercial_name_id: Option<i64>,
    ) -> Result<FfiPrescriptionLine, DynamedError> {
        let db = self.db.lock()?;
        let builder = PrescriptionBuilder::new(&db, &self.config);
        Ok(builder
            .add_line(&prescription_id, molecule_id, commercial_name_id)?
            .into())
    }

    /// Put another molecule on a line.
    pub fn change_line_molecule(
        &self,
        line_id: i64,
        molecule_id: i64,
        commercial_name_id: Option<i64>,
    ) -> Result<FfiPrescriptionLine, DynamedError> {
        let db = self.db.lock()?;
        let builder = PrescriptionBuilder::new(&db, &self.config);
        Ok(builder
            .change_line_molecule(line_id, molecule_id, commercial_name_id)?
            .into())
    }

    /// Choose or clear a line's commercial name.
    pub fn set_line_commercial_name(
        &self,
        line_id: i64,
        commercial_name_id: Option<i64>,
    ) -> Result<FfiPrescriptionLine, DynamedError> {
        let db = self.db.lock()?;
        let builder = PrescriptionBuilder::new(&db, &self.config);
        Ok(builder
            .set_line_commercial_name(line_id, commercial_name_id)?
            .into())
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, id: String) -> Result<Option<FfiPrescription>, DynamedError> {
        let db = self.db.lock()?;
        let prescription = db.get_prescription(&id)?;
        Ok(prescription.map(|p| p.into()))
    }

    /// Prescriptions of a consultation, oldest first.
    pub fn list_prescriptions(
        &self,
        consultation_id: String,
    ) -> Result<Vec<FfiPrescription>, DynamedError> {
        let db = self.db.lock()?;
        let builder = PrescriptionBuilder::new(&db, &self.config);
        let prescriptions = builder.list_prescriptions(&consultation_id)?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Reference Data Operations
    // =========================================================================

    /// Get or create a reference item. `kind` is e.g. "allergy" or "indication".
    pub fn get_or_create_reference(&self, kind: String, name: String) -> Result<i64, DynamedError> {
        let kind: ReferenceKind = kind.parse()?;
        let db = self.db.lock()?;
        Ok(db.get_or_create_reference(kind, name.trim())?)
    }

    /// Search reference items of a kind by name prefix.
    pub fn search_reference(
        &self,
        kind: String,
        prefix: String,
        limit: u32,
    ) -> Result<Vec<FfiReferenceItem>, DynamedError> {
        let kind: ReferenceKind = kind.parse()?;
        let db = self.db.lock()?;
        let items = db.search_reference(kind, &prefix, limit as usize)?;
        Ok(items.into_iter().map(|i| i.into()).collect())
    }

    /// Upsert a molecule with its associations.
    pub fn upsert_molecule(&self, record: FfiMoleculeRecord) -> Result<i64, DynamedError> {
        let db = self.db.lock()?;
        Ok(ReferenceImporter::new(&db).import_molecule(&record.into())?)
    }

    /// Upsert a diagnosis and its medical classes.
    pub fn upsert_diagnosis(
        &self,
        name: String,
        medical_classes: Vec<String>,
    ) -> Result<i64, DynamedError> {
        let db = self.db.lock()?;
        Ok(ReferenceImporter::new(&db).import_diagnosis(&name, &medical_classes)?)
    }

    /// Upsert a commercial name of a molecule.
    pub fn upsert_commercial_name(
        &self,
        record: FfiCommercialNameRecord,
    ) -> Result<i64, DynamedError> {
        let db = self.db.lock()?;
        Ok(ReferenceImporter::new(&db).import_commercial_name(&record.into())?)
    }

    /// Record interactions of one drug. Returns how many were new.
    pub fn import_interactions(&self, record: FfiInteractionRecord) -> Result<u32, DynamedError> {
        let db = self.db.lock()?;
        let created = ReferenceImporter::new(&db).import_interactions(&record.into())?;
        Ok(created as u32)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Recommendations as plain text, showing at most `limit` molecules.
    pub fn export_recommendations_text(
        &self,
        consultation_id: String,
        limit: Option<u32>,
    ) -> Result<String, DynamedError> {
        Ok(self.recommendation_report(&consultation_id, limit)?.to_text())
    }

    /// Recommendations as JSON, showing at most `limit` molecules.
    pub fn export_recommendations_json(
        &self,
        consultation_id: String,
        limit: Option<u32>,
    ) -> Result<String, DynamedError> {
        Ok(self.recommendation_report(&consultation_id, limit)?.to_json()?)
    }

    /// Recommendations as CSV, one row per shown molecule.
    pub fn export_recommendations_csv(
        &self,
        consultation_id: String,
        limit: Option<u32>,
    ) -> Result<String, DynamedError> {
        Ok(self.recommendation_report(&consultation_id, limit)?.to_csv())
    }

    /// Export a prescription document as JSON.
    pub fn export_prescription_json(&self, prescription_id: String) -> Result<String, DynamedError> {
        let db = self.db.lock()?;
        let document = PrescriptionExporter::new(&db).export(&prescription_id)?;
        Ok(document.to_json()?)
    }

    /// Export a prescription document as CSV.
    pub fn export_prescription_csv(&self, prescription_id: String) -> Result<String, DynamedError> {
        let db = self.db.lock()?;
        let document = PrescriptionExporter::new(&db).export(&prescription_id)?;
        Ok(document.to_csv())
    }
}

impl DynamedCore {
    fn recommendation_report(
        &self,
        consultation_id: &str,
        limit: Option<u32>,
    ) -> Result<RecommendationReport, DynamedError> {
        let db = self.db.lock()?;
        let ranked = Scorer::new(&db, self.config.scoring).score(consultation_id)?;
        Ok(RecommendationReport::from_ranked(
            consultation_id,
            &ranked,
            limit.map(|l| l as usize),
        ))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe clinical selection.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiClinicalSelection {
    pub diagnosis_ids: Vec<i64>,
    pub indication_ids: Vec<i64>,
    pub allergy_ids: Vec<i64>,
    pub medical_history_ids: Vec<i64>,
    pub current_medication_ids: Vec<i64>,
    pub precaution_ids: Vec<i64>,
    pub pregnant: bool,
    pub breastfeeding: bool,
}

impl From<FfiClinicalSelection> for ClinicalSelection {
    fn from(s: FfiClinicalSelection) -> Self {
        ClinicalSelection {
            diagnosis_ids: s.diagnosis_ids,
            indication_ids: s.indication_ids,
            allergy_ids: s.allergy_ids,
            medical_history_ids: s.medical_history_ids,
            current_medication_ids: s.current_medication_ids,
            precaution_ids: s.precaution_ids,
            pregnant: s.pregnant,
            breastfeeding: s.breastfeeding,
        }
    }
}

impl From<ClinicalSelection> for FfiClinicalSelection {
    fn from(s: ClinicalSelection) -> Self {
        Self {
            diagnosis_ids: s.diagnosis_ids,
            indication_ids: s.indication_ids,
            allergy_ids: s.allergy_ids,
            medical_history_ids: s.medical_history_ids,
            current_medication_ids: s.current_medication_ids,
            precaution_ids: s.precaution_ids,
            pregnant: s.pregnant,
            breastfeeding: s.breastfeeding,
        }
    }
}

/// FFI-safe consultation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultation {
    pub id: String,
    pub patient_ref: Option<String>,
    pub consultation_date: String,
    pub selection: FfiClinicalSelection,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Consultation> for FfiConsultation {
    fn from(c: Consultation) -> Self {
        Self {
            id: c.id,
            patient_ref: c.patient_ref,
            consultation_date: c.consultation_date,
            selection: c.selection.into(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// FFI-safe scored molecule.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScoredMolecule {
    pub molecule_id: i64,
    pub name: String,
    pub score: i32,
    pub indications: String,
    pub precautions: String,
    pub side_effects: String,
    pub commercial_names: String,
    pub medical_classes: String,
}

impl From<ScoredMolecule> for FfiScoredMolecule {
    fn from(m: ScoredMolecule) -> Self {
        Self {
            molecule_id: m.molecule_id,
            name: m.name,
            score: m.score,
            indications: m.indications,
            precautions: m.precautions,
            side_effects: m.side_effects,
            commercial_names: m.commercial_names,
            medical_classes: m.medical_classes,
        }
    }
}

/// FFI-safe molecule reference.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiMoleculeRef {
    pub id: i64,
    pub name: String,
}

impl From<MoleculeRef> for FfiMoleculeRef {
    fn from(r: MoleculeRef) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

/// FFI-safe interaction conflict.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConflict {
    pub molecule_id: i64,
    pub molecule_name: String,
    pub interaction_type: String,
    pub medical_class_id: Option<i64>,
}

impl From<Conflict> for FfiConflict {
    fn from(c: Conflict) -> Self {
        Self {
            molecule_id: c.molecule.id,
            molecule_name: c.molecule.name,
            interaction_type: c.interaction.interaction_type,
            medical_class_id: c.interaction.medical_class_id,
        }
    }
}

/// FFI-safe prescription line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionLine {
    pub line_id: i64,
    pub position: u32,
    pub molecule_id: i64,
    pub molecule_name: String,
    pub commercial_name_id: Option<i64>,
    pub commercial_name: Option<String>,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub packaging: Option<String>,
}

impl From<PrescriptionLine> for FfiPrescriptionLine {
    fn from(line: PrescriptionLine) -> Self {
        Self {
            line_id: line.id,
            position: line.position,
            molecule_id: line.molecule.id,
            molecule_name: line.molecule.name,
            commercial_name_id: line.commercial_name_id,
            commercial_name: line.commercial_name,
            dosage: line.dosage,
            form: line.form,
            packaging: line.packaging,
        }
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: String,
    pub reference: String,
    pub consultation_id: String,
    pub lines: Vec<FfiPrescriptionLine>,
    pub created_at: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id,
            reference: p.reference,
            consultation_id: p.consultation_id,
            lines: p.lines.into_iter().map(|l| l.into()).collect(),
            created_at: p.created_at,
        }
    }
}

/// FFI-safe skipped molecule.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSkippedMolecule {
    pub molecule_id: i64,
    pub molecule_name: String,
    pub reason: String,
}

impl From<SkippedMolecule> for FfiSkippedMolecule {
    fn from(s: SkippedMolecule) -> Self {
        Self {
            molecule_id: s.molecule.id,
            molecule_name: s.molecule.name,
            reason: s.reason,
        }
    }
}

/// FFI-safe generation outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGeneratedPrescription {
    pub prescription: FfiPrescription,
    pub skipped: Vec<FfiSkippedMolecule>,
}

impl From<GeneratedPrescription> for FfiGeneratedPrescription {
    fn from(g: GeneratedPrescription) -> Self {
        Self {
            prescription: g.prescription.into(),
            skipped: g.skipped.into_iter().map(|s| s.into()).collect(),
        }
    }
}

/// FFI-safe reference item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceItem {
    pub id: i64,
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<models::ReferenceItem> for FfiReferenceItem {
    fn from(item: models::ReferenceItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind.as_str().to_string(),
            name: item.name,
            description: item.description,
        }
    }
}

/// FFI-safe molecule record.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiMoleculeRecord {
    pub name: String,
    pub pregnancy_unsafe: bool,
    pub breastfeeding_unsafe: bool,
    pub major_side_effects: Option<String>,
    pub medical_classes: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
    pub current_medications: Vec<String>,
    pub indications: Vec<String>,
    pub precautions: Vec<String>,
}

impl From<FfiMoleculeRecord> for MoleculeRecord {
    fn from(r: FfiMoleculeRecord) -> Self {
        MoleculeRecord {
            name: r.name,
            pregnancy_unsafe: r.pregnancy_unsafe,
            breastfeeding_unsafe: r.breastfeeding_unsafe,
            major_side_effects: r.major_side_effects,
            medical_classes: r.medical_classes,
            allergies: r.allergies,
            medical_history: r.medical_history,
            current_medications: r.current_medications,
            indications: r.indications,
            precautions: r.precautions,
        }
    }
}

/// FFI-safe commercial name record.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiCommercialNameRecord {
    pub molecule: String,
    pub name: String,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub packaging: Option<String>,
}

impl From<FfiCommercialNameRecord> for CommercialNameRecord {
    fn from(r: FfiCommercialNameRecord) -> Self {
        CommercialNameRecord {
            molecule: r.molecule,
            name: r.name,
            dosage: r.dosage,
            form: r.form,
            packaging: r.packaging,
        }
    }
}

/// FFI-safe interaction record.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiInteractionRecord {
    pub molecule: String,
    pub interacts_with: Vec<String>,
    pub medical_class: Option<String>,
    pub interaction_type: String,
}

impl From<FfiInteractionRecord> for InteractionRecord {
    fn from(r: FfiInteractionRecord) -> Self {
        InteractionRecord {
            molecule: r.molecule,
            interacts_with: r.interacts_with,
            medical_class: r.medical_class,
            interaction_type: r.interaction_type,
        }
    }
}

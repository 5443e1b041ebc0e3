//! Consultation models: clinical selections, the resolved input bundle and
//! the cached recommendation snapshot.

use serde::{Deserialize, Serialize};

use super::reference::ReferenceKind;

/// A medical diagnosis and the therapeutic classes recommended for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    /// Store-assigned ID
    pub id: i64,
    /// Diagnosis name, unique
    pub name: String,
    /// Associated medical class IDs
    pub medical_class_ids: Vec<i64>,
}

/// What the practitioner selected during a consultation, by reference ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicalSelection {
    pub diagnosis_ids: Vec<i64>,
    pub indication_ids: Vec<i64>,
    pub allergy_ids: Vec<i64>,
    pub medical_history_ids: Vec<i64>,
    pub current_medication_ids: Vec<i64>,
    pub precaution_ids: Vec<i64>,
    pub pregnant: bool,
    pub breastfeeding: bool,
}

impl ClinicalSelection {
    /// Selected IDs for a reference kind. Medical classes are never selected
    /// directly; they derive from diagnoses.
    pub fn ids_for(&self, kind: ReferenceKind) -> &[i64] {
        match kind {
            ReferenceKind::Allergy => &self.allergy_ids,
            ReferenceKind::MedicalHistory => &self.medical_history_ids,
            ReferenceKind::CurrentMedication => &self.current_medication_ids,
            ReferenceKind::Indication => &self.indication_ids,
            ReferenceKind::Precaution => &self.precaution_ids,
            ReferenceKind::MedicalClass => &[],
        }
    }

    /// Mutable access to the selected IDs for a clinical-input kind.
    pub fn ids_for_mut(&mut self, kind: ReferenceKind) -> Option<&mut Vec<i64>> {
        match kind {
            ReferenceKind::Allergy => Some(&mut self.allergy_ids),
            ReferenceKind::MedicalHistory => Some(&mut self.medical_history_ids),
            ReferenceKind::CurrentMedication => Some(&mut self.current_medication_ids),
            ReferenceKind::Indication => Some(&mut self.indication_ids),
            ReferenceKind::Precaution => Some(&mut self.precaution_ids),
            ReferenceKind::MedicalClass => None,
        }
    }
}

/// A consultation and its clinical inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    /// Local UUID
    pub id: String,
    /// Patient identifier in the surrounding application
    pub patient_ref: Option<String>,
    /// Consultation date (YYYY-MM-DD)
    pub consultation_date: String,
    /// Clinical inputs
    pub selection: ClinicalSelection,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Consultation {
    /// Create a consultation dated today with no clinical inputs.
    pub fn new(patient_ref: Option<String>) -> Self {
        let now = chrono::Utc::now();
        let stamp = now.to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_ref,
            consultation_date: now.date_naive().to_string(),
            selection: ClinicalSelection::default(),
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }
}

/// The clinical inputs of one consultation, resolved to names for scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicalInputBundle {
    pub diagnoses: Vec<Diagnosis>,
    pub indications: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
    pub current_medications: Vec<String>,
    pub precautions: Vec<String>,
    pub pregnant: bool,
    pub breastfeeding: bool,
}

impl ClinicalInputBundle {
    /// Union of the medical classes of every selected diagnosis, sorted.
    pub fn medical_class_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .diagnoses
            .iter()
            .flat_map(|d| d.medical_class_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Cached scorer output for a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoleculeSnapshot {
    /// Owning consultation
    pub consultation_id: String,
    /// Recommended molecules, best first
    pub molecule_ids: Vec<i64>,
    /// Fingerprint of the inputs the snapshot was computed from
    pub fingerprint: String,
    /// Computation timestamp
    pub computed_at: String,
}

impl MoleculeSnapshot {
    pub fn is_empty(&self) -> bool {
        self.molecule_ids.is_empty()
    }

    /// Whether this snapshot was computed from inputs with `fingerprint`.
    pub fn is_current(&self, fingerprint: &str) -> bool {
        self.fingerprint == fingerprint
    }
}

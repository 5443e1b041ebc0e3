//! Prescription models.

use serde::{Deserialize, Serialize};

use super::molecule::{CommercialName, MoleculeRef};

/// A prescription generated for a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Local UUID
    pub id: String,
    /// Human-readable reference (e.g., "RX-00012")
    pub reference: String,
    /// Owning consultation
    pub consultation_id: String,
    /// Lines, in insertion order
    pub lines: Vec<PrescriptionLine>,
    /// Creation timestamp
    pub created_at: String,
}

impl Prescription {
    /// Create an empty prescription.
    pub fn new(consultation_id: String, reference: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            reference,
            consultation_id,
            lines: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn molecule_ids(&self) -> Vec<i64> {
        self.lines.iter().map(|l| l.molecule.id).collect()
    }
}

/// One molecule on a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionLine {
    /// Store-assigned ID
    pub id: i64,
    /// Owning prescription
    pub prescription_id: String,
    /// 0-based position within the prescription
    pub position: u32,
    /// Prescribed molecule
    pub molecule: MoleculeRef,
    /// Chosen brand, if any
    pub commercial_name_id: Option<i64>,
    pub commercial_name: Option<String>,
    /// Copied from the chosen brand
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub packaging: Option<String>,
}

impl PrescriptionLine {
    /// Build an unsaved line, deriving dosage, form and packaging from the brand.
    pub fn new(
        prescription_id: String,
        position: u32,
        molecule: MoleculeRef,
        commercial: Option<&CommercialName>,
    ) -> Self {
        let mut line = Self {
            id: 0,
            prescription_id,
            position,
            molecule,
            commercial_name_id: None,
            commercial_name: None,
            dosage: None,
            form: None,
            packaging: None,
        };
        line.apply_commercial_name(commercial);
        line
    }

    /// Replace the brand and everything derived from it.
    pub fn apply_commercial_name(&mut self, commercial: Option<&CommercialName>) {
        match commercial {
            Some(c) => {
                self.commercial_name_id = Some(c.id);
                self.commercial_name = Some(c.name.clone());
                self.dosage = c.dosage.clone();
                self.form = c.form.clone();
                self.packaging = c.packaging.clone();
            }
            None => {
                self.commercial_name_id = None;
                self.commercial_name = None;
                self.dosage = None;
                self.form = None;
                self.packaging = None;
            }
        }
    }
}

/// A snapshot molecule left off a generated prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedMolecule {
    pub molecule: MoleculeRef,
    /// Human-readable conflict description
    pub reason: String,
}

/// Result of generating a prescription from a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedPrescription {
    pub prescription: Prescription,
    /// Molecules omitted under the skip policy (always empty under abort)
    pub skipped: Vec<SkippedMolecule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_commercial() -> CommercialName {
        CommercialName {
            id: 11,
            molecule_id: 1,
            name: "Doliprane".into(),
            dosage: Some("1000 mg".into()),
            form: Some("comprimé".into()),
            packaging: Some("boîte de 8".into()),
        }
    }

    #[test]
    fn test_line_derives_commercial_details() {
        let commercial = make_commercial();
        let line = PrescriptionLine::new(
            "rx-1".into(),
            0,
            MoleculeRef {
                id: 1,
                name: "Paracétamol".into(),
            },
            Some(&commercial),
        );

        assert_eq!(line.commercial_name_id, Some(11));
        assert_eq!(line.dosage.as_deref(), Some("1000 mg"));
        assert_eq!(line.form.as_deref(), Some("comprimé"));
        assert_eq!(line.packaging.as_deref(), Some("boîte de 8"));
    }

    #[test]
    fn test_clearing_commercial_name_clears_details() {
        let commercial = make_commercial();
        let mut line = PrescriptionLine::new(
            "rx-1".into(),
            0,
            MoleculeRef {
                id: 1,
                name: "Paracétamol".into(),
            },
            Some(&commercial),
        );

        line.apply_commercial_name(None);
        assert!(line.commercial_name_id.is_none());
        assert!(line.dosage.is_none());
        assert!(line.form.is_none());
        assert!(line.packaging.is_none());
    }

    #[test]
    fn test_new_prescription() {
        let rx = Prescription::new("consult-1".into(), "RX-00001".into());
        assert_eq!(rx.id.len(), 36);
        assert!(rx.lines.is_empty());
        assert!(rx.molecule_ids().is_empty());
    }
}

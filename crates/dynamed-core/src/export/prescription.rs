//! Prescription documents for printing and hand-off.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, DbResult};
use crate::models::{Consultation, Prescription};

use super::escape_csv;

/// Prescription document metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionMetadata {
    /// Human-readable reference
    pub reference: String,
    pub prescription_id: String,
    pub consultation_id: String,
    /// Patient identifier in the surrounding application
    pub patient_ref: Option<String>,
    pub consultation_date: String,
    pub created_at: String,
    /// Export timestamp
    pub exported_at: String,
}

/// Single line of a prescription document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDocumentLine {
    /// 1-based, as printed
    pub number: u32,
    pub molecule: String,
    pub commercial_name: Option<String>,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub packaging: Option<String>,
}

/// A prescription ready to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDocument {
    pub metadata: PrescriptionMetadata,
    pub lines: Vec<PrescriptionDocumentLine>,
}

impl PrescriptionDocument {
    /// Build a document from a prescription and its consultation.
    pub fn from_prescription(prescription: &Prescription, consultation: &Consultation) -> Self {
        let lines = prescription
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| PrescriptionDocumentLine {
                number: i as u32 + 1,
                molecule: line.molecule.name.clone(),
                commercial_name: line.commercial_name.clone(),
                dosage: line.dosage.clone(),
                form: line.form.clone(),
                packaging: line.packaging.clone(),
            })
            .collect();

        Self {
            metadata: PrescriptionMetadata {
                reference: prescription.reference.clone(),
                prescription_id: prescription.id.clone(),
                consultation_id: consultation.id.clone(),
                patient_ref: consultation.patient_ref.clone(),
                consultation_date: consultation.consultation_date.clone(),
                created_at: prescription.created_at.clone(),
                exported_at: chrono::Utc::now().to_rfc3339(),
            },
            lines,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("reference,number,molecule,commercial_name,dosage,form,packaging\n");

        for line in &self.lines {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                escape_csv(&self.metadata.reference),
                line.number,
                escape_csv(&line.molecule),
                escape_csv(line.commercial_name.as_deref().unwrap_or("")),
                escape_csv(line.dosage.as_deref().unwrap_or("")),
                escape_csv(line.form.as_deref().unwrap_or("")),
                escape_csv(line.packaging.as_deref().unwrap_or("")),
            ));
        }
        csv
    }
}

/// Prescription exporter.
pub struct PrescriptionExporter<'a> {
    db: &'a Database,
}

impl<'a> PrescriptionExporter<'a> {
    /// Create a new prescription exporter.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export one prescription.
    pub fn export(&self, prescription_id: &str) -> DbResult<PrescriptionDocument> {
        let prescription = self
            .db
            .get_prescription(prescription_id)?
            .ok_or_else(|| DbError::NotFound(format!("prescription {}", prescription_id)))?;
        let consultation = self
            .db
            .get_consultation(&prescription.consultation_id)?
            .ok_or_else(|| {
                DbError::NotFound(format!("consultation {}", prescription.consultation_id))
            })?;
        Ok(PrescriptionDocument::from_prescription(&prescription, &consultation))
    }

    /// Export every prescription of a consultation, oldest first.
    pub fn export_consultation(&self, consultation_id: &str) -> DbResult<Vec<PrescriptionDocument>> {
        let consultation = self
            .db
            .get_consultation(consultation_id)?
            .ok_or_else(|| DbError::NotFound(format!("consultation {}", consultation_id)))?;
        Ok(self
            .db
            .list_prescriptions_for_consultation(consultation_id)?
            .iter()
            .map(|p| PrescriptionDocument::from_prescription(p, &consultation))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommercialName, MoleculeRef, PrescriptionLine};

    fn make_prescription(consultation: &Consultation) -> Prescription {
        let mut rx = Prescription::new(consultation.id.clone(), "RX-00007".into());
        let mut doliprane = CommercialName::new(1, "Doliprane".into());
        doliprane.dosage = Some("1000 mg".into());
        doliprane.form = Some("comprimé, sécable".into());
        rx.lines = vec![
            PrescriptionLine::new(
                rx.id.clone(),
                0,
                MoleculeRef {
                    id: 1,
                    name: "Paracétamol".into(),
                },
                Some(&doliprane),
            ),
            PrescriptionLine::new(
                rx.id.clone(),
                1,
                MoleculeRef {
                    id: 2,
                    name: "Amoxicilline".into(),
                },
                None,
            ),
        ];
        rx
    }

    #[test]
    fn test_document_from_prescription() {
        let consultation = Consultation::new(Some("patient-9".into()));
        let doc = PrescriptionDocument::from_prescription(&make_prescription(&consultation), &consultation);

        assert_eq!(doc.metadata.reference, "RX-00007");
        assert_eq!(doc.metadata.patient_ref.as_deref(), Some("patient-9"));
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].number, 1);
        assert_eq!(doc.lines[0].commercial_name.as_deref(), Some("Doliprane"));
        assert!(doc.lines[1].dosage.is_none());
    }

    #[test]
    fn test_document_csv() {
        let consultation = Consultation::new(None);
        let doc = PrescriptionDocument::from_prescription(&make_prescription(&consultation), &consultation);

        let csv = doc.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // Header + 2 lines
        assert_eq!(
            lines[1],
            "RX-00007,1,Paracétamol,Doliprane,1000 mg,\"comprimé, sécable\","
        );
        assert_eq!(lines[2], "RX-00007,2,Amoxicilline,,,,");
    }

    #[test]
    fn test_exporter_missing_prescription() {
        let db = Database::open_in_memory().unwrap();
        let exporter = PrescriptionExporter::new(&db);
        assert!(matches!(exporter.export("missing"), Err(DbError::NotFound(_))));
    }
}

//! Prescription generation and line editing.
//!
//! Every line that enters a prescription, and every molecule change on an
//! existing line, passes the interaction gate against the other lines. The
//! check and the write share one transaction.

use crate::config::{ConflictPolicy, EngineConfig};
use crate::db::{Database, DbError};
use crate::interactions::{
    assert_no_conflicts, BlockingConflict, InteractionError, InteractionIndex,
};
use crate::models::{
    CommercialName, GeneratedPrescription, Molecule, MoleculeRef, Prescription, PrescriptionLine,
    SkippedMolecule,
};
use crate::scoring::{Scorer, ScoringError};
use thiserror::Error;

/// Prescription errors.
#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("No valid molecules to prescribe for this consultation")]
    NoValidMolecules,

    #[error(transparent)]
    BlockingConflict(#[from] BlockingConflict),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<InteractionError> for PrescriptionError {
    fn from(e: InteractionError) -> Self {
        match e {
            InteractionError::Database(e) => PrescriptionError::Database(e),
            InteractionError::Blocking(b) => PrescriptionError::BlockingConflict(b),
        }
    }
}

pub type PrescriptionResult<T> = Result<T, PrescriptionError>;

/// Builds and edits prescriptions for stored consultations.
pub struct PrescriptionBuilder<'a> {
    db: &'a Database,
    config: &'a EngineConfig,
}

impl<'a> PrescriptionBuilder<'a> {
    /// Create a new builder.
    pub fn new(db: &'a Database, config: &'a EngineConfig) -> Self {
        Self { db, config }
    }

    /// Turn the consultation's current recommendations into a prescription.
    ///
    /// Molecules are added in ranked order with their first commercial name.
    /// Under [`ConflictPolicy::Abort`] the first interaction rolls the whole
    /// prescription back; under [`ConflictPolicy::Skip`] the molecule is left
    /// off and reported in [`GeneratedPrescription::skipped`].
    pub fn generate_prescription(&self, consultation_id: &str) -> PrescriptionResult<GeneratedPrescription> {
        let snapshot = Scorer::new(self.db, self.config.scoring).current_snapshot(consultation_id)?;
        if snapshot.is_empty() {
            return Err(PrescriptionError::NoValidMolecules);
        }

        let generated = self.db.atomically(|db| -> PrescriptionResult<GeneratedPrescription> {
            let reference = db.next_prescription_reference(&self.config.reference_prefix)?;
            let mut prescription = Prescription::new(consultation_id.to_string(), reference);
            db.insert_prescription(&prescription)?;

            let index = InteractionIndex::for_molecules(db, &snapshot.molecule_ids)?;
            let mut selected: Vec<MoleculeRef> = Vec::new();
            let mut skipped = Vec::new();

            for molecule_id in &snapshot.molecule_ids {
                let molecule = load_molecule(db, *molecule_id)?;
                let candidate = molecule.to_ref();

                match assert_no_conflicts(&index, &candidate, &selected) {
                    Ok(()) => {}
                    Err(InteractionError::Blocking(blocking))
                        if self.config.conflict_policy == ConflictPolicy::Skip =>
                    {
                        tracing::warn!(
                            prescription = %prescription.reference,
                            molecule = %candidate.name,
                            "molecule skipped"
                        );
                        skipped.push(SkippedMolecule {
                            molecule: candidate,
                            reason: blocking.pairs().join("; "),
                        });
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }

                let position = prescription.lines.len() as u32;
                let mut line = PrescriptionLine::new(
                    prescription.id.clone(),
                    position,
                    candidate.clone(),
                    molecule.first_commercial_name(),
                );
                line.id = db.insert_line(&line)?;
                tracing::debug!(
                    prescription = %prescription.reference,
                    molecule = %candidate.name,
                    position,
                    "line added"
                );

                prescription.lines.push(line);
                selected.push(candidate);
            }

            Ok(GeneratedPrescription {
                prescription,
                skipped,
            })
        })?;

        tracing::info!(
            consultation_id,
            prescription = %generated.prescription.reference,
            lines = generated.prescription.lines.len(),
            skipped = generated.skipped.len(),
            "prescription generated"
        );
        Ok(generated)
    }

    /// Append a molecule to a prescription. Without a commercial name the
    /// molecule's first one is used.
    pub fn add_line(
        &self,
        prescription_id: &str,
        molecule_id: i64,
        commercial_name_id: Option<i64>,
    ) -> PrescriptionResult<PrescriptionLine> {
        self.db.atomically(|db| {
            let prescription = db
                .get_prescription(prescription_id)?
                .ok_or_else(|| PrescriptionError::NotFound(format!("prescription {}", prescription_id)))?;
            let molecule = load_molecule(db, molecule_id)?;
            let commercial = resolve_commercial_name(&molecule, commercial_name_id)?;

            let selected: Vec<MoleculeRef> = prescription
                .lines
                .iter()
                .map(|l| l.molecule.clone())
                .collect();
            assert_no_conflicts(db, &molecule.to_ref(), &selected)?;

            let position = db.next_line_position(prescription_id)?;
            let mut line = PrescriptionLine::new(
                prescription_id.to_string(),
                position,
                molecule.to_ref(),
                commercial.as_ref(),
            );
            line.id = db.insert_line(&line)?;

            tracing::debug!(
                prescription = %prescription.reference,
                molecule = %molecule.name,
                position,
                "line added"
            );
            Ok(line)
        })
    }

    /// Put another molecule on an existing line. The new molecule is checked
    /// against every other line of the prescription, and the commercial name
    /// resets to the given one or the molecule's first.
    pub fn change_line_molecule(
        &self,
        line_id: i64,
        molecule_id: i64,
        commercial_name_id: Option<i64>,
    ) -> PrescriptionResult<PrescriptionLine> {
        self.db.atomically(|db| {
            let mut line = load_line(db, line_id)?;
            let molecule = load_molecule(db, molecule_id)?;
            let commercial = resolve_commercial_name(&molecule, commercial_name_id)?;

            let others: Vec<MoleculeRef> = db
                .list_lines(&line.prescription_id)?
                .into_iter()
                .filter(|l| l.id != line.id)
                .map(|l| l.molecule)
                .collect();
            assert_no_conflicts(db, &molecule.to_ref(), &others)?;

            line.molecule = molecule.to_ref();
            line.apply_commercial_name(commercial.as_ref());
            db.update_line(&line)?;

            tracing::debug!(line_id, molecule = %molecule.name, "line molecule changed");
            Ok(line)
        })
    }

    /// Choose or clear a line's commercial name. It must belong to the
    /// line's molecule.
    pub fn set_line_commercial_name(
        &self,
        line_id: i64,
        commercial_name_id: Option<i64>,
    ) -> PrescriptionResult<PrescriptionLine> {
        self.db.atomically(|db| {
            let mut line = load_line(db, line_id)?;

            let commercial = match commercial_name_id {
                Some(id) => {
                    let commercial = db
                        .get_commercial_name(id)?
                        .ok_or_else(|| PrescriptionError::NotFound(format!("commercial name {}", id)))?;
                    if commercial.molecule_id != line.molecule.id {
                        return Err(PrescriptionError::InvalidInput(format!(
                            "{} is not a commercial name of {}",
                            commercial.name, line.molecule.name
                        )));
                    }
                    Some(commercial)
                }
                None => None,
            };

            line.apply_commercial_name(commercial.as_ref());
            db.update_line(&line)?;
            Ok(line)
        })
    }

    pub fn get_prescription(&self, prescription_id: &str) -> PrescriptionResult<Option<Prescription>> {
        Ok(self.db.get_prescription(prescription_id)?)
    }

    /// Prescriptions of a consultation, oldest first.
    pub fn list_prescriptions(&self, consultation_id: &str) -> PrescriptionResult<Vec<Prescription>> {
        Ok(self.db.list_prescriptions_for_consultation(consultation_id)?)
    }
}

fn load_molecule(db: &Database, molecule_id: i64) -> PrescriptionResult<Molecule> {
    db.get_molecule(molecule_id)?
        .ok_or_else(|| PrescriptionError::NotFound(format!("molecule {}", molecule_id)))
}

fn load_line(db: &Database, line_id: i64) -> PrescriptionResult<PrescriptionLine> {
    db.get_line(line_id)?
        .ok_or_else(|| PrescriptionError::NotFound(format!("prescription line {}", line_id)))
}

/// The requested commercial name of `molecule`, or its first one.
fn resolve_commercial_name(
    molecule: &Molecule,
    commercial_name_id: Option<i64>,
) -> PrescriptionResult<Option<CommercialName>> {
    match commercial_name_id {
        Some(id) => molecule
            .commercial_names
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                PrescriptionError::InvalidInput(format!(
                    "commercial name {} does not belong to {}",
                    id, molecule.name
                ))
            }),
        None => Ok(molecule.first_commercial_name().cloned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClinicalSelection, Consultation, Interaction, ReferenceKind};

    struct Fixture {
        db: Database,
        consultation: Consultation,
        para: i64,
        ibu: i64,
        aspirine: i64,
    }

    /// Three recommended molecules: Ibuprofène (4), Paracétamol (2), Aspirine (2).
    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();

        let mut para = Molecule::new(0, "Paracétamol".into());
        para.indications = vec!["fièvre".into()];
        para.medical_classes = vec!["Antalgiques".into()];
        para.commercial_names = vec![
            CommercialName::new(0, "Doliprane".into()),
            CommercialName::new(0, "Dafalgan".into()),
        ];
        let para = db.save_molecule(&para).unwrap();

        let mut ibu = Molecule::new(0, "Ibuprofène".into());
        ibu.indications = vec!["fièvre".into(), "douleur".into()];
        ibu.medical_classes = vec!["Antalgiques".into()];
        ibu.commercial_names = vec![CommercialName::new(0, "Advil".into())];
        let ibu = db.save_molecule(&ibu).unwrap();

        let mut aspirine = Molecule::new(0, "Aspirine".into());
        aspirine.indications = vec!["douleur".into()];
        aspirine.medical_classes = vec!["Antalgiques".into()];
        let aspirine = db.save_molecule(&aspirine).unwrap();

        let diagnosis = db.save_diagnosis("Syndrome grippal", &["Antalgiques".into()]).unwrap();
        let fievre = db
            .get_or_create_reference(ReferenceKind::Indication, "fièvre")
            .unwrap();
        let douleur = db
            .get_or_create_reference(ReferenceKind::Indication, "douleur")
            .unwrap();

        let mut consultation = Consultation::new(None);
        consultation.selection = ClinicalSelection {
            diagnosis_ids: vec![diagnosis],
            indication_ids: vec![fievre, douleur],
            ..Default::default()
        };
        db.insert_consultation(&consultation).unwrap();

        Fixture {
            db,
            consultation,
            para,
            ibu,
            aspirine,
        }
    }

    #[test]
    fn test_generate_uses_ranked_order_and_first_brand() {
        let f = setup();
        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);

        let generated = builder.generate_prescription(&f.consultation.id).unwrap();
        let rx = &generated.prescription;
        assert_eq!(rx.reference, "RX-00001");
        assert_eq!(rx.molecule_ids(), vec![f.ibu, f.para, f.aspirine]);
        assert_eq!(rx.lines[1].commercial_name.as_deref(), Some("Doliprane"));
        assert!(rx.lines[2].commercial_name.is_none());
        assert!(generated.skipped.is_empty());

        let stored = builder.get_prescription(&rx.id).unwrap().unwrap();
        assert_eq!(&stored, rx);
    }

    #[test]
    fn test_abort_rolls_back() {
        let f = setup();
        f.db.insert_interaction(&Interaction::new(f.aspirine, f.ibu, "potentiation".into()))
            .unwrap();
        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);

        let err = builder.generate_prescription(&f.consultation.id).unwrap_err();
        match err {
            PrescriptionError::BlockingConflict(blocking) => {
                assert_eq!(blocking.candidate.id, f.aspirine);
                assert_eq!(blocking.pairs(), vec!["Aspirine + Ibuprofène: potentiation"]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(builder.list_prescriptions(&f.consultation.id).unwrap().is_empty());
    }

    #[test]
    fn test_skip_policy_records_skipped() {
        let f = setup();
        f.db.insert_interaction(&Interaction::new(f.para, f.ibu, "potentiation".into()))
            .unwrap();
        let config = EngineConfig {
            conflict_policy: ConflictPolicy::Skip,
            ..Default::default()
        };
        let builder = PrescriptionBuilder::new(&f.db, &config);

        let generated = builder.generate_prescription(&f.consultation.id).unwrap();
        assert_eq!(generated.prescription.molecule_ids(), vec![f.ibu, f.aspirine]);
        assert_eq!(generated.skipped.len(), 1);
        assert_eq!(generated.skipped[0].molecule.id, f.para);
        assert!(generated.skipped[0].reason.contains("potentiation"));

        // Positions stay contiguous
        let positions: Vec<u32> = generated.prescription.lines.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_no_valid_molecules() {
        let f = setup();
        let mut selection = f.consultation.selection.clone();
        selection.indication_ids.clear();
        f.db.update_selection(&f.consultation.id, &selection).unwrap();

        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);
        assert!(matches!(
            builder.generate_prescription(&f.consultation.id),
            Err(PrescriptionError::NoValidMolecules)
        ));
    }

    #[test]
    fn test_add_line_is_gated() {
        let f = setup();
        f.db.insert_interaction(&Interaction::new(f.para, f.aspirine, "antagonisme".into()))
            .unwrap();
        let config = EngineConfig {
            conflict_policy: ConflictPolicy::Skip,
            ..Default::default()
        };
        let builder = PrescriptionBuilder::new(&f.db, &config);
        let generated = builder.generate_prescription(&f.consultation.id).unwrap();
        let rx_id = generated.prescription.id.clone();
        assert_eq!(generated.prescription.molecule_ids(), vec![f.ibu, f.para]);

        let err = builder.add_line(&rx_id, f.aspirine, None).unwrap_err();
        assert!(matches!(err, PrescriptionError::BlockingConflict(_)));
        assert_eq!(f.db.list_lines(&rx_id).unwrap().len(), 2);
    }

    #[test]
    fn test_add_line_defaults_brand_and_rejects_foreign_brand() {
        let f = setup();
        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);
        let rx = builder
            .generate_prescription(&f.consultation.id)
            .unwrap()
            .prescription;

        let advil = f.db.list_commercial_names(f.ibu).unwrap()[0].id;
        let err = builder.add_line(&rx.id, f.para, Some(advil)).unwrap_err();
        assert!(matches!(err, PrescriptionError::InvalidInput(_)));

        let line = builder.add_line(&rx.id, f.para, None).unwrap();
        assert_eq!(line.position, 3);
        assert_eq!(line.commercial_name.as_deref(), Some("Doliprane"));
    }

    #[test]
    fn test_change_line_molecule_checks_other_lines() {
        let f = setup();
        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);
        let rx = builder
            .generate_prescription(&f.consultation.id)
            .unwrap()
            .prescription;

        let warfarine = f.db.get_or_create_molecule("Warfarine").unwrap();
        f.db.insert_interaction(&Interaction::new(warfarine, f.aspirine, "risque hémorragique".into()))
            .unwrap();

        // The line being replaced is not checked against itself
        let aspirine_line = rx.lines[2].id;
        let changed = builder
            .change_line_molecule(aspirine_line, warfarine, None)
            .unwrap();
        assert_eq!(changed.molecule.name, "Warfarine");
        assert!(changed.commercial_name_id.is_none());

        let para_line = rx.lines[1].id;
        let err = builder
            .change_line_molecule(para_line, f.aspirine, None)
            .unwrap_err();
        assert!(matches!(err, PrescriptionError::BlockingConflict(_)));
        assert_eq!(f.db.get_line(para_line).unwrap().unwrap().molecule.id, f.para);
    }

    #[test]
    fn test_change_line_molecule_resets_brand() {
        let f = setup();
        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);
        let rx = builder
            .generate_prescription(&f.consultation.id)
            .unwrap()
            .prescription;

        let ibu_line = rx.lines[0].id;
        assert_eq!(rx.lines[0].commercial_name.as_deref(), Some("Advil"));

        // Aspirine has no commercial name to fall back on
        let changed = builder
            .change_line_molecule(ibu_line, f.aspirine, None)
            .unwrap();
        assert!(changed.commercial_name.is_none());
        assert!(changed.dosage.is_none());
    }

    #[test]
    fn test_set_line_commercial_name() {
        let f = setup();
        let config = EngineConfig::default();
        let builder = PrescriptionBuilder::new(&f.db, &config);
        let rx = builder
            .generate_prescription(&f.consultation.id)
            .unwrap()
            .prescription;
        let para_line = rx.lines[1].id;

        let dafalgan = f.db.list_commercial_names(f.para).unwrap()[1].id;
        let line = builder
            .set_line_commercial_name(para_line, Some(dafalgan))
            .unwrap();
        assert_eq!(line.commercial_name.as_deref(), Some("Dafalgan"));

        let advil = f.db.list_commercial_names(f.ibu).unwrap()[0].id;
        assert!(matches!(
            builder.set_line_commercial_name(para_line, Some(advil)),
            Err(PrescriptionError::InvalidInput(_))
        ));

        let cleared = builder.set_line_commercial_name(para_line, None).unwrap();
        assert!(cleared.commercial_name_id.is_none());
    }

    #[test]
    fn test_references_increment() {
        let f = setup();
        let config = EngineConfig {
            reference_prefix: "ORD".into(),
            ..Default::default()
        };
        let builder = PrescriptionBuilder::new(&f.db, &config);

        builder.generate_prescription(&f.consultation.id).unwrap();
        let second = builder.generate_prescription(&f.consultation.id).unwrap();
        assert_eq!(second.prescription.reference, "ORD-00002");
        assert_eq!(builder.list_prescriptions(&f.consultation.id).unwrap().len(), 2);
    }
}

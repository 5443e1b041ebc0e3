//! End-to-end recommendation scenarios.
//!
//! Each scenario imports a small formulary, records a consultation and checks
//! what the scorer and the prescription builder make of it.

use dynamed_core::config::{ConflictPolicy, EngineConfig, ScoringWeights};
use dynamed_core::db::Database;
use dynamed_core::import::{InteractionRecord, MoleculeRecord, ReferenceImporter};
use dynamed_core::models::{ClinicalSelection, Consultation, ReferenceKind};
use dynamed_core::prescription::{PrescriptionBuilder, PrescriptionError};
use dynamed_core::scoring::{Scorer, ScoringError};

fn molecule(name: &str, indications: &[&str], precautions: &[&str]) -> MoleculeRecord {
    MoleculeRecord {
        name: name.into(),
        medical_classes: vec!["C1".into()],
        indications: indications.iter().map(|s| s.to_string()).collect(),
        precautions: precautions.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn reference_id(db: &Database, kind: ReferenceKind, name: &str) -> i64 {
    db.get_or_create_reference(kind, name).unwrap()
}

/// D1 recommends C1; the consultation selects D1 and the fever indication.
fn consultation(db: &Database, with_diagnosis: bool, pregnant: bool) -> Consultation {
    let d1 = db.save_diagnosis("D1", &["C1".into()]).unwrap();

    let mut consultation = Consultation::new(Some("patient-1".into()));
    consultation.selection = ClinicalSelection {
        diagnosis_ids: if with_diagnosis { vec![d1] } else { Vec::new() },
        indication_ids: vec![reference_id(db, ReferenceKind::Indication, "fièvre")],
        pregnant,
        ..Default::default()
    };
    db.insert_consultation(&consultation).unwrap();
    consultation
}

#[test]
fn test_scenario_single_indication_match() {
    let db = Database::open_in_memory().unwrap();
    ReferenceImporter::new(&db)
        .import_molecule(&molecule("M1", &["fièvre"], &[]))
        .unwrap();
    let consultation = consultation(&db, true, false);

    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].name, "M1");
    assert_eq!(ranked[0].score, 2);
}

#[test]
fn test_scenario_pregnancy_excludes_without_error() {
    let db = Database::open_in_memory().unwrap();
    let mut m1 = molecule("M1", &["fièvre"], &[]);
    m1.pregnancy_unsafe = true;
    ReferenceImporter::new(&db).import_molecule(&m1).unwrap();
    let consultation = consultation(&db, true, true);

    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();
    assert!(ranked.is_empty());

    // An empty ranking is a valid snapshot, but nothing can be prescribed
    let config = EngineConfig::default();
    let result = PrescriptionBuilder::new(&db, &config).generate_prescription(&consultation.id);
    assert!(matches!(result, Err(PrescriptionError::NoValidMolecules)));
}

#[test]
fn test_scenario_no_diagnosis() {
    let db = Database::open_in_memory().unwrap();
    ReferenceImporter::new(&db)
        .import_molecule(&molecule("M1", &["fièvre"], &[]))
        .unwrap();
    let consultation = consultation(&db, false, false);

    let result = Scorer::new(&db, ScoringWeights::default()).score(&consultation.id);
    assert!(matches!(result, Err(ScoringError::NoMedicalClass)));

    // Nothing was cached for the failed attempt
    assert!(db.get_snapshot(&consultation.id).unwrap().is_none());
}

fn interacting_pair(db: &Database) -> Consultation {
    let importer = ReferenceImporter::new(db);
    importer
        .import_molecule(&molecule("M1", &["fièvre"], &[]))
        .unwrap();
    importer
        .import_molecule(&molecule("M2", &["fièvre"], &[]))
        .unwrap();
    importer
        .import_interactions(&InteractionRecord {
            molecule: "M1".into(),
            interacts_with: vec!["M2".into()],
            medical_class: None,
            interaction_type: "potentiation".into(),
        })
        .unwrap();
    consultation(db, true, false)
}

#[test]
fn test_scenario_interaction_aborts_generation() {
    let db = Database::open_in_memory().unwrap();
    let consultation = interacting_pair(&db);
    let config = EngineConfig::default();

    let err = PrescriptionBuilder::new(&db, &config)
        .generate_prescription(&consultation.id)
        .unwrap_err();

    match err {
        PrescriptionError::BlockingConflict(blocking) => {
            let message = blocking.to_string();
            assert!(message.contains("M1"));
            assert!(message.contains("M2"));
            assert!(message.contains("potentiation"));
        }
        other => panic!("expected a blocking conflict, got {:?}", other),
    }
    assert!(db
        .list_prescriptions_for_consultation(&consultation.id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_scenario_interaction_skipped() {
    let db = Database::open_in_memory().unwrap();
    let consultation = interacting_pair(&db);
    let config = EngineConfig {
        conflict_policy: ConflictPolicy::Skip,
        ..Default::default()
    };

    let generated = PrescriptionBuilder::new(&db, &config)
        .generate_prescription(&consultation.id)
        .unwrap();

    // Equal scores keep pool order, so M1 is placed and M2 is left off
    assert_eq!(generated.prescription.molecule_ids().len(), 1);
    assert_eq!(generated.prescription.lines[0].molecule.name, "M1");
    assert_eq!(generated.skipped.len(), 1);
    assert_eq!(generated.skipped[0].molecule.name, "M2");
    assert!(generated.skipped[0].reason.contains("potentiation"));
}

#[test]
fn test_scenario_precaution_offsets_indication() {
    let db = Database::open_in_memory().unwrap();
    ReferenceImporter::new(&db)
        .import_molecule(&molecule("M1", &["fièvre"], &["insuffisance rénale"]))
        .unwrap();
    let mut consultation = consultation(&db, true, false);
    consultation.selection.precaution_ids =
        vec![reference_id(&db, ReferenceKind::Precaution, "insuffisance rénale")];
    db.update_selection(&consultation.id, &consultation.selection)
        .unwrap();

    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].score, 1);
}

#[test]
fn test_scenario_medical_history_excludes_best_match() {
    let db = Database::open_in_memory().unwrap();
    let importer = ReferenceImporter::new(&db);
    let mut m1 = molecule("M1", &["fièvre", "douleur"], &[]);
    m1.medical_history = vec!["ulcère gastrique".into()];
    importer.import_molecule(&m1).unwrap();
    importer
        .import_molecule(&molecule("M2", &["fièvre"], &[]))
        .unwrap();

    let mut consultation = consultation(&db, true, false);
    consultation
        .selection
        .indication_ids
        .push(reference_id(&db, ReferenceKind::Indication, "douleur"));
    db.update_selection(&consultation.id, &consultation.selection)
        .unwrap();
    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();
    assert_eq!(ranked[0].name, "M1");
    assert_eq!(ranked[0].score, 4);

    consultation.selection.medical_history_ids =
        vec![reference_id(&db, ReferenceKind::MedicalHistory, "Ulcère Gastrique")];
    db.update_selection(&consultation.id, &consultation.selection)
        .unwrap();

    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();
    let names: Vec<&str> = ranked.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["M2"]);
}

#[test]
fn test_custom_threshold_filters_weak_matches() {
    let db = Database::open_in_memory().unwrap();
    ReferenceImporter::new(&db)
        .import_molecule(&molecule("M1", &["fièvre"], &["insuffisance rénale"]))
        .unwrap();
    let mut consultation = consultation(&db, true, false);
    consultation.selection.precaution_ids =
        vec![reference_id(&db, ReferenceKind::Precaution, "insuffisance rénale")];
    db.update_selection(&consultation.id, &consultation.selection)
        .unwrap();

    let strict = ScoringWeights {
        min_score: 1,
        ..Default::default()
    };
    let ranked = Scorer::new(&db, strict).score(&consultation.id).unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn test_matching_ignores_case() {
    let db = Database::open_in_memory().unwrap();
    ReferenceImporter::new(&db)
        .import_molecule(&molecule("M1", &["Fièvre"], &[]))
        .unwrap();
    let mut consultation = consultation(&db, true, false);
    consultation.selection.allergy_ids = vec![reference_id(&db, ReferenceKind::Allergy, "LATEX")];
    db.update_selection(&consultation.id, &consultation.selection)
        .unwrap();

    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();
    assert_eq!(ranked[0].score, 2);

    // An allergy listed under another case still excludes the molecule
    let mut allergic = molecule("M1", &[], &[]);
    allergic.allergies = vec!["latex".into()];
    ReferenceImporter::new(&db).import_molecule(&allergic).unwrap();
    let ranked = Scorer::new(&db, ScoringWeights::default())
        .score(&consultation.id)
        .unwrap();
    assert!(ranked.is_empty());
}

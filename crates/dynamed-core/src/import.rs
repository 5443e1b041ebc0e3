//! Reference-data population from already-parsed records.
//!
//! Every import is idempotent: names are get-or-created, molecules and
//! commercial names are upserted, and interactions are only added when the
//! same pair and class are not already recorded.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{CommercialName, Interaction, Molecule, MoleculePair, ReferenceKind};

/// One molecule row. Empty association lists leave the stored set as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MoleculeRecord {
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

impl MoleculeRecord {
    fn links(&self) -> [(ReferenceKind, &[String]); 6] {
        [
            (ReferenceKind::MedicalClass, self.medical_classes.as_slice()),
            (ReferenceKind::Allergy, self.allergies.as_slice()),
            (ReferenceKind::MedicalHistory, self.medical_history.as_slice()),
            (ReferenceKind::CurrentMedication, self.current_medications.as_slice()),
            (ReferenceKind::Indication, self.indications.as_slice()),
            (ReferenceKind::Precaution, self.precautions.as_slice()),
        ]
    }
}

/// A brand of a molecule, named by the molecule's INN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommercialNameRecord {
    pub molecule: String,
    pub name: String,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub packaging: Option<String>,
}

/// A drug and the drugs it interacts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionRecord {
    pub molecule: String,
    pub interacts_with: Vec<String>,
    pub medical_class: Option<String>,
    pub interaction_type: String,
}

/// Writes parsed reference records into the store.
pub struct ReferenceImporter<'a> {
    db: &'a Database,
}

impl<'a> ReferenceImporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get-or-create a batch of items of one kind. Returns their IDs.
    pub fn import_reference_items(&self, kind: ReferenceKind, names: &[String]) -> DbResult<Vec<i64>> {
        self.db.atomically(|db| {
            names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(|n| db.get_or_create_reference(kind, n))
                .collect()
        })
    }

    /// Upsert a molecule by name and replace each non-empty association set.
    pub fn import_molecule(&self, record: &MoleculeRecord) -> DbResult<i64> {
        let name = record.name.trim();
        self.db.atomically(|db| {
            let mut molecule = Molecule::new(0, name.to_string());
            molecule.pregnancy_unsafe = record.pregnancy_unsafe;
            molecule.breastfeeding_unsafe = record.breastfeeding_unsafe;
            molecule.major_side_effects = record
                .major_side_effects
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);
            let id = db.upsert_molecule(&molecule)?;

            for (kind, names) in record.links() {
                if !names.is_empty() {
                    db.set_molecule_links(id, kind, names)?;
                }
            }

            tracing::debug!(molecule = name, id, "molecule imported");
            Ok(id)
        })
    }

    /// Upsert a diagnosis and replace its medical classes.
    pub fn import_diagnosis(&self, name: &str, medical_classes: &[String]) -> DbResult<i64> {
        let id = self.db.save_diagnosis(name.trim(), medical_classes)?;
        tracing::debug!(diagnosis = name, id, "diagnosis imported");
        Ok(id)
    }

    /// Upsert a commercial name, creating its molecule if needed.
    pub fn import_commercial_name(&self, record: &CommercialNameRecord) -> DbResult<i64> {
        self.db.atomically(|db| {
            let molecule_id = db.get_or_create_molecule(record.molecule.trim())?;
            let mut commercial = CommercialName::new(molecule_id, record.name.trim().to_string());
            commercial.dosage = record.dosage.clone();
            commercial.form = record.form.clone();
            commercial.packaging = record.packaging.clone();
            db.upsert_commercial_name(&commercial)
        })
    }

    /// Record the interactions of one drug. Each drug is ensured both as a
    /// molecule and as a current-medication item. Returns how many
    /// interactions were created.
    pub fn import_interactions(&self, record: &InteractionRecord) -> DbResult<usize> {
        self.db.atomically(|db| {
            let first = ensure_drug(db, record.molecule.trim())?;
            let class_id = match record.medical_class.as_deref().map(str::trim) {
                Some(class) if !class.is_empty() => {
                    Some(db.get_or_create_reference(ReferenceKind::MedicalClass, class)?)
                }
                _ => None,
            };

            let mut created = 0;
            for other in &record.interacts_with {
                let other = other.trim();
                if other.is_empty() {
                    continue;
                }
                let second = ensure_drug(db, other)?;
                if db.interaction_exists(MoleculePair::new(first, second), class_id)? {
                    continue;
                }

                let mut interaction =
                    Interaction::new(first, second, record.interaction_type.trim().to_string());
                interaction.medical_class_id = class_id;
                db.insert_interaction(&interaction)?;
                created += 1;
            }

            tracing::debug!(molecule = %record.molecule, created, "interactions imported");
            Ok(created)
        })
    }
}

fn ensure_drug(db: &Database, name: &str) -> DbResult<i64> {
    db.get_or_create_reference(ReferenceKind::CurrentMedication, name)?;
    db.get_or_create_molecule(name)
}

/// Split a delimited list cell into trimmed, non-empty values.
///
/// Commas always separate. A hyphen separates when whitespace touches it, so
/// `"fièvre - toux"` splits but `"anti-inflammatoire"` does not.
pub fn split_values(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut values = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let is_separator = match c {
            ',' => true,
            '-' => {
                let before = i == 0 || chars[i - 1].is_whitespace();
                let after = i + 1 == chars.len() || chars[i + 1].is_whitespace();
                before || after
            }
            _ => false,
        };

        if is_separator {
            push_value(&mut values, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_value(&mut values, &current);
    values
}

fn push_value(values: &mut Vec<String>, raw: &str) {
    let value = raw.trim();
    if !value.is_empty() {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_split_values() {
        assert_eq!(split_values("fièvre, toux - douleur"), vec!["fièvre", "toux", "douleur"]);
        assert_eq!(split_values("anti-inflammatoire"), vec!["anti-inflammatoire"]);
        assert_eq!(split_values("- a\n- b"), vec!["a", "b"]);
        assert_eq!(split_values(" , ,"), Vec::<String>::new());
        assert!(split_values("").is_empty());
    }

    #[test]
    fn test_import_molecule_replaces_provided_sets() {
        let db = setup_db();
        let importer = ReferenceImporter::new(&db);

        let mut record = MoleculeRecord {
            name: " Ibuprofène ".into(),
            pregnancy_unsafe: true,
            major_side_effects: Some("ulcère gastrique".into()),
            medical_classes: vec!["AINS".into()],
            indications: vec!["douleur".into(), "fièvre".into()],
            allergies: vec!["aspirine".into()],
            ..Default::default()
        };
        let id = importer.import_molecule(&record).unwrap();

        record.indications = vec!["inflammation".into()];
        record.allergies.clear();
        assert_eq!(importer.import_molecule(&record).unwrap(), id);

        let molecule = db.get_molecule(id).unwrap().unwrap();
        assert_eq!(molecule.name, "Ibuprofène");
        assert!(molecule.pregnancy_unsafe);
        assert_eq!(molecule.indications, vec!["inflammation"]);
        // Empty list leaves the stored set untouched
        assert_eq!(molecule.allergies, vec!["aspirine"]);
        assert_eq!(molecule.medical_classes, vec!["AINS"]);
    }

    #[test]
    fn test_import_commercial_name_upserts() {
        let db = setup_db();
        let importer = ReferenceImporter::new(&db);

        let mut record = CommercialNameRecord {
            molecule: "Paracétamol".into(),
            name: "Doliprane".into(),
            dosage: Some("500 mg".into()),
            ..Default::default()
        };
        let first = importer.import_commercial_name(&record).unwrap();
        record.dosage = Some("1000 mg".into());
        let second = importer.import_commercial_name(&record).unwrap();
        assert_eq!(first, second);

        let molecule = db.get_molecule_by_name("Paracétamol").unwrap().unwrap();
        assert_eq!(molecule.commercial_names.len(), 1);
        assert_eq!(molecule.commercial_names[0].dosage.as_deref(), Some("1000 mg"));
    }

    #[test]
    fn test_import_interactions_once_per_pair_and_class() {
        let db = setup_db();
        let importer = ReferenceImporter::new(&db);

        let record = InteractionRecord {
            molecule: "Warfarine".into(),
            interacts_with: vec!["Aspirine".into(), "Fluconazole".into(), " ".into()],
            medical_class: Some("Anticoagulants".into()),
            interaction_type: "potentiation".into(),
        };
        assert_eq!(importer.import_interactions(&record).unwrap(), 2);
        assert_eq!(importer.import_interactions(&record).unwrap(), 0);

        // Reversed pair under the same class is the same interaction
        let reversed = InteractionRecord {
            molecule: "Aspirine".into(),
            interacts_with: vec!["Warfarine".into()],
            ..record.clone()
        };
        assert_eq!(importer.import_interactions(&reversed).unwrap(), 0);

        let warfarine = db.get_molecule_by_name("Warfarine").unwrap().unwrap();
        assert_eq!(db.list_interactions_for(warfarine.id).unwrap().len(), 2);
        assert!(db
            .find_reference(ReferenceKind::CurrentMedication, "Fluconazole")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_import_diagnosis_and_items() {
        let db = setup_db();
        let importer = ReferenceImporter::new(&db);

        let id = importer
            .import_diagnosis("Angine", &["Antibiotiques".into()])
            .unwrap();
        assert_eq!(db.get_diagnosis(id).unwrap().unwrap().medical_class_ids.len(), 1);

        let ids = importer
            .import_reference_items(
                ReferenceKind::Precaution,
                &["insuffisance rénale".into(), "".into(), "insuffisance rénale".into()],
            )
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
    }
}

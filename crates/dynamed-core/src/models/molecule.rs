//! Molecule and commercial-name models.

use serde::{Deserialize, Serialize};

/// A drug molecule with its safety and indication metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Molecule {
    /// Store-assigned ID
    pub id: i64,
    /// International non-proprietary name, unique
    pub name: String,
    /// Contraindicated during pregnancy
    pub pregnancy_unsafe: bool,
    /// Contraindicated while breastfeeding
    pub breastfeeding_unsafe: bool,
    /// Major side effects, free text
    pub major_side_effects: Option<String>,
    /// Allergies that contraindicate this molecule
    pub allergies: Vec<String>,
    /// Medical history items that contraindicate this molecule
    pub medical_history: Vec<String>,
    /// Current medications that contraindicate this molecule
    pub current_medications: Vec<String>,
    /// Indications this molecule treats
    pub indications: Vec<String>,
    /// Precautions attached to this molecule
    pub precautions: Vec<String>,
    /// Therapeutic classes this molecule belongs to
    pub medical_classes: Vec<String>,
    /// Brand names, ordered by ID
    pub commercial_names: Vec<CommercialName>,
}

impl Molecule {
    /// Create a molecule with no associations.
    pub fn new(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            pregnancy_unsafe: false,
            breastfeeding_unsafe: false,
            major_side_effects: None,
            allergies: Vec::new(),
            medical_history: Vec::new(),
            current_medications: Vec::new(),
            indications: Vec::new(),
            precautions: Vec::new(),
            medical_classes: Vec::new(),
            commercial_names: Vec::new(),
        }
    }

    /// The commercial name a generated prescription line defaults to.
    pub fn first_commercial_name(&self) -> Option<&CommercialName> {
        self.commercial_names.first()
    }

    /// Lightweight reference for conflict reports and snapshots.
    pub fn to_ref(&self) -> MoleculeRef {
        MoleculeRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// ID and name of a molecule, enough to name it in messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MoleculeRef {
    pub id: i64,
    pub name: String,
}

/// A brand under which a molecule is sold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommercialName {
    /// Store-assigned ID
    pub id: i64,
    /// Owning molecule
    pub molecule_id: i64,
    /// Brand name
    pub name: String,
    /// Dosage (e.g., "500 mg")
    pub dosage: Option<String>,
    /// Pharmaceutical form (e.g., "comprimé")
    pub form: Option<String>,
    /// Packaging (e.g., "boîte de 16")
    pub packaging: Option<String>,
}

impl CommercialName {
    /// Create a commercial name with only the required fields.
    pub fn new(molecule_id: i64, name: String) -> Self {
        Self {
            id: 0,
            molecule_id,
            name,
            dosage: None,
            form: None,
            packaging: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_commercial_name() {
        let mut molecule = Molecule::new(1, "Paracétamol".into());
        assert!(molecule.first_commercial_name().is_none());

        molecule.commercial_names = vec![
            CommercialName::new(1, "Doliprane".into()),
            CommercialName::new(1, "Efferalgan".into()),
        ];
        assert_eq!(molecule.first_commercial_name().unwrap().name, "Doliprane");
    }

    #[test]
    fn test_to_ref() {
        let molecule = Molecule::new(7, "Ibuprofène".into());
        let r = molecule.to_ref();
        assert_eq!(r.id, 7);
        assert_eq!(r.name, "Ibuprofène");
    }
}

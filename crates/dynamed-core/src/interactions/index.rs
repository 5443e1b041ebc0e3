//! In-memory interaction lookup.

use std::collections::HashMap;

use crate::db::{Database, DbResult};
use crate::models::{Interaction, MoleculePair};

use super::InteractionLookup;

/// Interactions keyed by canonical pair. The first record for a pair wins,
/// matching the store's lowest-ID rule when loaded from it.
#[derive(Debug, Clone, Default)]
pub struct InteractionIndex {
    by_pair: HashMap<MoleculePair, Interaction>,
}

impl InteractionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every interaction touching any of `molecule_ids`.
    pub fn for_molecules(db: &Database, molecule_ids: &[i64]) -> DbResult<Self> {
        let mut index = Self::new();
        for id in molecule_ids {
            for interaction in db.list_interactions_for(*id)? {
                index.insert(interaction);
            }
        }
        Ok(index)
    }

    /// Add an interaction. Returns false when its pair is already indexed.
    pub fn insert(&mut self, interaction: Interaction) -> bool {
        match self.by_pair.entry(interaction.pair) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(interaction);
                true
            }
        }
    }

    pub fn get(&self, a: i64, b: i64) -> Option<&Interaction> {
        self.by_pair.get(&MoleculePair::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

impl FromIterator<Interaction> for InteractionIndex {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        let mut index = Self::new();
        for interaction in iter {
            index.insert(interaction);
        }
        index
    }
}

impl InteractionLookup for InteractionIndex {
    fn find_interaction(&self, a: i64, b: i64) -> DbResult<Option<Interaction>> {
        Ok(self.get(a, b).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_insert_wins() {
        let mut index = InteractionIndex::new();
        assert!(index.insert(Interaction::new(1, 2, "potentiation".into())));
        assert!(!index.insert(Interaction::new(2, 1, "antagonisme".into())));

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(2, 1).unwrap().interaction_type, "potentiation");
    }

    #[test]
    fn test_for_molecules_matches_store() {
        let db = Database::open_in_memory().unwrap();
        let a = db.get_or_create_molecule("Warfarine").unwrap();
        let b = db.get_or_create_molecule("Aspirine").unwrap();
        let c = db.get_or_create_molecule("Fluconazole").unwrap();
        db.insert_interaction(&Interaction::new(b, a, "risque hémorragique".into()))
            .unwrap();
        db.insert_interaction(&Interaction::new(a, b, "potentiation".into()))
            .unwrap();
        db.insert_interaction(&Interaction::new(c, a, "inhibition enzymatique".into()))
            .unwrap();

        let index = InteractionIndex::for_molecules(&db, &[b, c]).unwrap();
        assert_eq!(index.len(), 2);
        for (x, y) in [(a, b), (c, a)] {
            assert_eq!(
                index.find_interaction(x, y).unwrap(),
                db.find_interaction(x, y).unwrap()
            );
        }
    }
}

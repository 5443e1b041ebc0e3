//! Drug-drug interaction checking.
//!
//! Any recorded interaction between a candidate and an already-selected
//! molecule is a hard conflict. There is no severity grading.

mod index;

pub use index::*;

use std::fmt;

use crate::db::{Database, DbError, DbResult};
use crate::models::{Interaction, MoleculeRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source of interaction records. Lookups are symmetric in `a` and `b`.
pub trait InteractionLookup {
    fn find_interaction(&self, a: i64, b: i64) -> DbResult<Option<Interaction>>;
}

impl InteractionLookup for Database {
    fn find_interaction(&self, a: i64, b: i64) -> DbResult<Option<Interaction>> {
        Database::find_interaction(self, a, b)
    }
}

/// A selected molecule that interacts with the candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    pub molecule: MoleculeRef,
    pub interaction: Interaction,
}

/// Conflicts of one candidate, at most one per selected molecule, in
/// selection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConflictSet {
    conflicts: Vec<Conflict>,
}

impl ConflictSet {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// The conflict with a given selected molecule.
    pub fn get(&self, molecule_id: i64) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| c.molecule.id == molecule_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    pub fn into_vec(self) -> Vec<Conflict> {
        self.conflicts
    }

    fn push(&mut self, conflict: Conflict) {
        if self.get(conflict.molecule.id).is_none() {
            self.conflicts.push(conflict);
        }
    }
}

/// A candidate that cannot join the selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockingConflict {
    pub candidate: MoleculeRef,
    pub conflicts: Vec<Conflict>,
}

impl BlockingConflict {
    /// One "candidate + other: type" line per conflicting pair.
    pub fn pairs(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .map(|c| {
                format!(
                    "{} + {}: {}",
                    self.candidate.name, c.molecule.name, c.interaction.interaction_type
                )
            })
            .collect()
    }
}

impl fmt::Display for BlockingConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Drug interactions detected:")?;
        for pair in self.pairs() {
            write!(f, "\n- {}", pair)?;
        }
        Ok(())
    }
}

impl std::error::Error for BlockingConflict {}

/// Interaction check errors.
#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Blocking(#[from] BlockingConflict),
}

/// Every selected molecule that interacts with `candidate`.
pub fn find_conflicts<L: InteractionLookup + ?Sized>(
    lookup: &L,
    candidate: &MoleculeRef,
    selected: &[MoleculeRef],
) -> DbResult<ConflictSet> {
    let mut conflicts = ConflictSet::default();
    for other in selected {
        if conflicts.get(other.id).is_some() {
            continue;
        }
        if let Some(interaction) = lookup.find_interaction(candidate.id, other.id)? {
            conflicts.push(Conflict {
                molecule: other.clone(),
                interaction,
            });
        }
    }
    Ok(conflicts)
}

/// Fail with [`BlockingConflict`] if `candidate` interacts with any selected molecule.
pub fn assert_no_conflicts<L: InteractionLookup + ?Sized>(
    lookup: &L,
    candidate: &MoleculeRef,
    selected: &[MoleculeRef],
) -> Result<(), InteractionError> {
    let conflicts = find_conflicts(lookup, candidate, selected)?;
    if conflicts.is_empty() {
        return Ok(());
    }

    tracing::warn!(
        candidate = %candidate.name,
        conflicts = conflicts.len(),
        "interaction blocks molecule"
    );
    Err(BlockingConflict {
        candidate: candidate.clone(),
        conflicts: conflicts.into_vec(),
    }
    .into())
}

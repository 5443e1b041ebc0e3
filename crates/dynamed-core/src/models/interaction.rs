//! Drug-drug interaction models.

use serde::{Deserialize, Serialize};

/// An unordered pair of molecule IDs, stored with the lower ID first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoleculePair {
    low: i64,
    high: i64,
}

impl MoleculePair {
    /// Canonicalize two molecule IDs into an unordered pair.
    pub fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    /// The member of the pair that is not `id`, if `id` is a member.
    pub fn other(&self, id: i64) -> Option<i64> {
        if id == self.low {
            Some(self.high)
        } else if id == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.low == id || self.high == id
    }
}

/// A known interaction between two molecules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Store-assigned ID
    pub id: i64,
    /// The interacting molecules
    pub pair: MoleculePair,
    /// Therapeutic class the interaction was recorded under
    pub medical_class_id: Option<i64>,
    /// Nature of the interaction (e.g., "potentiation")
    pub interaction_type: String,
}

impl Interaction {
    /// Create an interaction between two molecules, in either order.
    pub fn new(a: i64, b: i64, interaction_type: String) -> Self {
        Self {
            id: 0,
            pair: MoleculePair::new(a, b),
            medical_class_id: None,
            interaction_type,
        }
    }
}

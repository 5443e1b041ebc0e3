//! Interaction database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{Interaction, MoleculePair};

impl Database {
    /// Insert an interaction. The pair is stored canonicalized.
    pub fn insert_interaction(&self, interaction: &Interaction) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO interactions (molecule_low, molecule_high, medical_class_id, interaction_type)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                interaction.pair.low(),
                interaction.pair.high(),
                interaction.medical_class_id,
                interaction.interaction_type,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// First recorded interaction between two molecules, in either order.
    pub fn find_interaction(&self, a: i64, b: i64) -> DbResult<Option<Interaction>> {
        let pair = MoleculePair::new(a, b);
        self.conn
            .query_row(
                r#"
                SELECT id, molecule_low, molecule_high, medical_class_id, interaction_type
                FROM interactions
                WHERE molecule_low = ?1 AND molecule_high = ?2
                ORDER BY id
                LIMIT 1
                "#,
                params![pair.low(), pair.high()],
                map_interaction_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Whether an interaction is recorded for the pair under the given class.
    pub fn interaction_exists(&self, pair: MoleculePair, medical_class_id: Option<i64>) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM interactions
            WHERE molecule_low = ?1 AND molecule_high = ?2
            AND medical_class_id IS ?3
            "#,
            params![pair.low(), pair.high(), medical_class_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All interactions involving a molecule.
    pub fn list_interactions_for(&self, molecule_id: i64) -> DbResult<Vec<Interaction>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, molecule_low, molecule_high, medical_class_id, interaction_type
            FROM interactions
            WHERE molecule_low = ?1 OR molecule_high = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([molecule_id], map_interaction_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an interaction.
    pub fn delete_interaction(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM interactions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn map_interaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Interaction> {
    Ok(Interaction {
        id: row.get(0)?,
        pair: MoleculePair::new(row.get(1)?, row.get(2)?),
        medical_class_id: row.get(3)?,
        interaction_type: row.get(4)?,
    })
}

//! Prescription database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbError, DbResult};
use crate::models::{MoleculeRef, Prescription, PrescriptionLine};

const LINE_COLUMNS: &str = r#"
    SELECT pl.id, pl.prescription_id, pl.position, pl.molecule_id, m.name,
           pl.commercial_name_id, cn.name, pl.dosage, pl.form, pl.packaging
    FROM prescription_lines pl
    JOIN molecules m ON m.id = pl.molecule_id
    LEFT JOIN commercial_names cn ON cn.id = pl.commercial_name_id
"#;

impl Database {
    /// Draw the next prescription reference, e.g. `RX-00001`.
    pub fn next_prescription_reference(&self, prefix: &str) -> DbResult<String> {
        let number: i64 = self.conn.query_row(
            r#"
            UPDATE sequences SET next_value = next_value + 1
            WHERE name = 'prescription'
            RETURNING next_value - 1
            "#,
            [],
            |row| row.get(0),
        )?;
        Ok(format!("{}-{:05}", prefix, number))
    }

    /// Insert a prescription header. Lines are inserted separately.
    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO prescriptions (id, reference, consultation_id, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    prescription.id,
                    prescription.reference,
                    prescription.consultation_id,
                    prescription.created_at,
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    /// Get a prescription with its lines.
    pub fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>> {
        let header: Option<(String, String, String, String)> = self
            .conn
            .query_row(
                "SELECT id, reference, consultation_id, created_at FROM prescriptions WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match header {
            Some((id, reference, consultation_id, created_at)) => {
                let lines = self.list_lines(&id)?;
                Ok(Some(Prescription {
                    id,
                    reference,
                    consultation_id,
                    lines,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    /// Prescriptions of a consultation, oldest first.
    pub fn list_prescriptions_for_consultation(&self, consultation_id: &str) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id FROM prescriptions
            WHERE consultation_id = ?
            ORDER BY created_at, reference
            "#,
        )?;
        let ids = stmt
            .query_map([consultation_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut prescriptions = Vec::with_capacity(ids.len());
        for id in ids {
            let prescription = self
                .get_prescription(&id)?
                .ok_or_else(|| DbError::NotFound(format!("prescription {}", id)))?;
            prescriptions.push(prescription);
        }
        Ok(prescriptions)
    }

    /// Delete a prescription and its lines.
    pub fn delete_prescription(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Insert a line. Returns the assigned ID.
    pub fn insert_line(&self, line: &PrescriptionLine) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO prescription_lines (
                    prescription_id, position, molecule_id, commercial_name_id,
                    dosage, form, packaging
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    line.prescription_id,
                    line.position,
                    line.molecule.id,
                    line.commercial_name_id,
                    line.dosage,
                    line.form,
                    line.packaging,
                ],
            )
            .map_err(map_constraint)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update a line's molecule and brand fields.
    pub fn update_line(&self, line: &PrescriptionLine) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE prescription_lines SET
                    molecule_id = ?2,
                    commercial_name_id = ?3,
                    dosage = ?4,
                    form = ?5,
                    packaging = ?6
                WHERE id = ?1
                "#,
                params![
                    line.id,
                    line.molecule.id,
                    line.commercial_name_id,
                    line.dosage,
                    line.form,
                    line.packaging,
                ],
            )
            .map_err(map_constraint)?;
        Ok(rows_affected > 0)
    }

    /// Get a line by ID.
    pub fn get_line(&self, id: i64) -> DbResult<Option<PrescriptionLine>> {
        let sql = format!("{} WHERE pl.id = ?", LINE_COLUMNS);
        self.conn
            .query_row(&sql, [id], map_line_row)
            .optional()
            .map_err(Into::into)
    }

    /// Lines of a prescription, by position.
    pub fn list_lines(&self, prescription_id: &str) -> DbResult<Vec<PrescriptionLine>> {
        let sql = format!(
            "{} WHERE pl.prescription_id = ? ORDER BY pl.position",
            LINE_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map([prescription_id], map_line_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Position for the next line appended to a prescription.
    pub fn next_line_position(&self, prescription_id: &str) -> DbResult<u32> {
        let next: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM prescription_lines WHERE prescription_id = ?",
            [prescription_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Delete a line.
    pub fn delete_line(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescription_lines WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn map_line_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionLine> {
    Ok(PrescriptionLine {
        id: row.get(0)?,
        prescription_id: row.get(1)?,
        position: row.get(2)?,
        molecule: MoleculeRef {
            id: row.get(3)?,
            name: row.get(4)?,
        },
        commercial_name_id: row.get(5)?,
        commercial_name: row.get(6)?,
        dosage: row.get(7)?,
        form: row.get(8)?,
        packaging: row.get(9)?,
    })
}

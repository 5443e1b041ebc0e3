//! Consultation and snapshot database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{
    ClinicalInputBundle, ClinicalSelection, Consultation, MoleculeSnapshot, ReferenceKind,
};

impl Database {
    /// Insert a new consultation with its clinical inputs.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        self.validate_selection(&consultation.selection)?;

        self.atomically(|db| {
            db.conn.execute(
                r#"
                INSERT INTO consultations (
                    id, patient_ref, consultation_date, pregnant, breastfeeding,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    consultation.id,
                    consultation.patient_ref,
                    consultation.consultation_date,
                    consultation.selection.pregnant,
                    consultation.selection.breastfeeding,
                    consultation.created_at,
                    consultation.updated_at,
                ],
            )?;
            db.write_selection_rows(&consultation.id, &consultation.selection)
        })
    }

    /// Get a consultation with its clinical inputs.
    pub fn get_consultation(&self, id: &str) -> DbResult<Option<Consultation>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, patient_ref, consultation_date, pregnant, breastfeeding,
                       created_at, updated_at
                FROM consultations
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(ConsultationRow {
                        id: row.get(0)?,
                        patient_ref: row.get(1)?,
                        consultation_date: row.get(2)?,
                        pregnant: row.get(3)?,
                        breastfeeding: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()?;

        match row {
            Some(row) => {
                let selection = self.load_selection(&row.id, row.pregnant, row.breastfeeding)?;
                Ok(Some(Consultation {
                    id: row.id,
                    patient_ref: row.patient_ref,
                    consultation_date: row.consultation_date,
                    selection,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                }))
            }
            None => Ok(None),
        }
    }

    /// List consultation IDs for a patient, most recent first.
    pub fn list_consultations_for_patient(&self, patient_ref: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id FROM consultations
            WHERE patient_ref = ?
            ORDER BY consultation_date DESC, created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_ref], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replace a consultation's clinical inputs. Invalidates its snapshot.
    pub fn update_selection(&self, consultation_id: &str, selection: &ClinicalSelection) -> DbResult<bool> {
        self.validate_selection(selection)?;

        let updated = self.atomically(|db| -> DbResult<bool> {
            let rows_affected = db.conn.execute(
                r#"
                UPDATE consultations SET
                    pregnant = ?2,
                    breastfeeding = ?3,
                    updated_at = ?4
                WHERE id = ?1
                "#,
                params![
                    consultation_id,
                    selection.pregnant,
                    selection.breastfeeding,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
            if rows_affected == 0 {
                return Ok(false);
            }

            db.conn.execute(
                "DELETE FROM consultation_diagnoses WHERE consultation_id = ?",
                [consultation_id],
            )?;
            db.conn.execute(
                "DELETE FROM consultation_items WHERE consultation_id = ?",
                [consultation_id],
            )?;
            db.write_selection_rows(consultation_id, selection)?;
            db.delete_snapshot(consultation_id)?;
            Ok(true)
        })?;

        if updated {
            tracing::debug!(consultation_id, "clinical inputs updated, snapshot invalidated");
        }
        Ok(updated)
    }

    /// Delete a consultation. Prescriptions and snapshot cascade.
    pub fn delete_consultation(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM consultations WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Resolve a consultation's inputs to the names and diagnoses scoring needs.
    pub fn load_input_bundle(&self, consultation_id: &str) -> DbResult<ClinicalInputBundle> {
        let consultation = self
            .get_consultation(consultation_id)?
            .ok_or_else(|| DbError::NotFound(format!("consultation {}", consultation_id)))?;
        let selection = &consultation.selection;

        Ok(ClinicalInputBundle {
            diagnoses: self.get_diagnoses(&selection.diagnosis_ids)?,
            indications: self.reference_names(ReferenceKind::Indication, &selection.indication_ids)?,
            allergies: self.reference_names(ReferenceKind::Allergy, &selection.allergy_ids)?,
            medical_history: self
                .reference_names(ReferenceKind::MedicalHistory, &selection.medical_history_ids)?,
            current_medications: self.reference_names(
                ReferenceKind::CurrentMedication,
                &selection.current_medication_ids,
            )?,
            precautions: self.reference_names(ReferenceKind::Precaution, &selection.precaution_ids)?,
            pregnant: selection.pregnant,
            breastfeeding: selection.breastfeeding,
        })
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Get the cached recommendation snapshot of a consultation.
    pub fn get_snapshot(&self, consultation_id: &str) -> DbResult<Option<MoleculeSnapshot>> {
        let row: Option<(String, String, String, String)> = self
            .conn
            .query_row(
                r#"
                SELECT consultation_id, molecule_ids, fingerprint, computed_at
                FROM molecule_snapshots
                WHERE consultation_id = ?
                "#,
                [consultation_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(|(consultation_id, ids, fingerprint, computed_at)| {
            Ok(MoleculeSnapshot {
                consultation_id,
                molecule_ids: serde_json::from_str(&ids)?,
                fingerprint,
                computed_at,
            })
        })
        .transpose()
    }

    /// Store a snapshot, replacing any previous one.
    pub fn put_snapshot(&self, snapshot: &MoleculeSnapshot) -> DbResult<()> {
        let ids_json = serde_json::to_string(&snapshot.molecule_ids)?;
        self.conn.execute(
            r#"
            INSERT INTO molecule_snapshots (consultation_id, molecule_ids, fingerprint, computed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(consultation_id) DO UPDATE SET
                molecule_ids = excluded.molecule_ids,
                fingerprint = excluded.fingerprint,
                computed_at = excluded.computed_at
            "#,
            params![
                snapshot.consultation_id,
                ids_json,
                snapshot.fingerprint,
                snapshot.computed_at,
            ],
        )?;
        Ok(())
    }

    /// Drop a consultation's snapshot.
    pub fn delete_snapshot(&self, consultation_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM molecule_snapshots WHERE consultation_id = ?",
            [consultation_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Check that every selected ID exists and is filed under its own kind.
    fn validate_selection(&self, selection: &ClinicalSelection) -> DbResult<()> {
        for kind in ReferenceKind::CLINICAL_INPUTS {
            self.reference_names(kind, selection.ids_for(kind))?;
        }
        self.get_diagnoses(&selection.diagnosis_ids)?;
        Ok(())
    }

    fn write_selection_rows(&self, consultation_id: &str, selection: &ClinicalSelection) -> DbResult<()> {
        for diagnosis_id in &selection.diagnosis_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO consultation_diagnoses (consultation_id, diagnosis_id) VALUES (?1, ?2)",
                params![consultation_id, diagnosis_id],
            )?;
        }
        for kind in ReferenceKind::CLINICAL_INPUTS {
            for item_id in selection.ids_for(kind) {
                self.conn.execute(
                    "INSERT OR IGNORE INTO consultation_items (consultation_id, item_id) VALUES (?1, ?2)",
                    params![consultation_id, item_id],
                )?;
            }
        }
        Ok(())
    }

    fn load_selection(&self, consultation_id: &str, pregnant: bool, breastfeeding: bool) -> DbResult<ClinicalSelection> {
        let mut selection = ClinicalSelection {
            pregnant,
            breastfeeding,
            ..Default::default()
        };

        let mut stmt = self.conn.prepare_cached(
            "SELECT diagnosis_id FROM consultation_diagnoses WHERE consultation_id = ? ORDER BY diagnosis_id",
        )?;
        let rows = stmt.query_map([consultation_id], |row| row.get(0))?;
        selection.diagnosis_ids = rows.collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT ri.kind, ri.id
            FROM consultation_items ci
            JOIN reference_items ri ON ri.id = ci.item_id
            WHERE ci.consultation_id = ?
            ORDER BY ri.id
            "#,
        )?;
        let rows = stmt.query_map([consultation_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (kind, id) = row?;
            let kind = kind
                .parse::<ReferenceKind>()
                .map_err(|e| DbError::Constraint(e.to_string()))?;
            if let Some(ids) = selection.ids_for_mut(kind) {
                ids.push(id);
            }
        }

        Ok(selection)
    }
}

/// Intermediate row struct for database mapping.
struct ConsultationRow {
    id: String,
    patient_ref: Option<String>,
    consultation_date: String,
    pregnant: bool,
    breastfeeding: bool,
    created_at: String,
    updated_at: String,
}

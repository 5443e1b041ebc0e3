//! Diagnosis database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbError, DbResult};
use crate::models::{Diagnosis, ReferenceKind};

impl Database {
    /// Get a diagnosis ID by name, creating it if missing.
    pub fn get_or_create_diagnosis(&self, name: &str) -> DbResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM diagnoses WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?;
        match existing {
            Some(id) => Ok(id),
            None => {
                self.conn
                    .execute("INSERT INTO diagnoses (name) VALUES (?)", [name])?;
                Ok(self.conn.last_insert_rowid())
            }
        }
    }

    /// Replace a diagnosis' medical classes.
    pub fn set_diagnosis_classes(&self, diagnosis_id: i64, medical_class_ids: &[i64]) -> DbResult<()> {
        self.conn.execute(
            "DELETE FROM diagnosis_classes WHERE diagnosis_id = ?",
            [diagnosis_id],
        )?;
        for class_id in medical_class_ids {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO diagnosis_classes (diagnosis_id, medical_class_id) VALUES (?1, ?2)",
                    params![diagnosis_id, class_id],
                )
                .map_err(map_constraint)?;
        }
        Ok(())
    }

    /// Upsert a diagnosis by name and replace its classes with the named
    /// medical classes, creating missing ones. Returns the diagnosis ID.
    pub fn save_diagnosis(&self, name: &str, medical_classes: &[String]) -> DbResult<i64> {
        self.atomically(|db| {
            let id = db.get_or_create_diagnosis(name)?;
            let class_ids = medical_classes
                .iter()
                .map(|c| db.get_or_create_reference(ReferenceKind::MedicalClass, c))
                .collect::<DbResult<Vec<_>>>()?;
            db.set_diagnosis_classes(id, &class_ids)?;
            Ok(id)
        })
    }

    /// Get a diagnosis with its classes.
    pub fn get_diagnosis(&self, id: i64) -> DbResult<Option<Diagnosis>> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row("SELECT id, name FROM diagnoses WHERE id = ?", [id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        match row {
            Some((id, name)) => Ok(Some(Diagnosis {
                id,
                name,
                medical_class_ids: self.diagnosis_class_ids(id)?,
            })),
            None => Ok(None),
        }
    }

    /// Get several diagnoses, ordered by name. Every ID must exist.
    pub fn get_diagnoses(&self, ids: &[i64]) -> DbResult<Vec<Diagnosis>> {
        let mut diagnoses = Vec::with_capacity(ids.len());
        for id in ids {
            let diagnosis = self
                .get_diagnosis(*id)?
                .ok_or_else(|| DbError::NotFound(format!("diagnosis {}", id)))?;
            if !diagnoses.iter().any(|d: &Diagnosis| d.id == diagnosis.id) {
                diagnoses.push(diagnosis);
            }
        }
        diagnoses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(diagnoses)
    }

    /// List all diagnoses, ordered by name.
    pub fn list_diagnoses(&self) -> DbResult<Vec<Diagnosis>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM diagnoses ORDER BY name")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut diagnoses = Vec::new();
        for row in rows {
            let (id, name) = row?;
            diagnoses.push(Diagnosis {
                id,
                name,
                medical_class_ids: self.diagnosis_class_ids(id)?,
            });
        }
        Ok(diagnoses)
    }

    fn diagnosis_class_ids(&self, diagnosis_id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT medical_class_id FROM diagnosis_classes WHERE diagnosis_id = ? ORDER BY medical_class_id",
        )?;
        let rows = stmt.query_map([diagnosis_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

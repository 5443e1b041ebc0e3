//! Molecule and commercial-name database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{CommercialName, Molecule, MoleculeRef, ReferenceKind};

impl Database {
    /// Insert or update a molecule's own fields, keyed by name.
    ///
    /// Associations and commercial names are left untouched. Returns the ID.
    pub fn upsert_molecule(&self, molecule: &Molecule) -> DbResult<i64> {
        let id = self.conn.query_row(
            r#"
            INSERT INTO molecules (name, pregnancy_unsafe, breastfeeding_unsafe, major_side_effects)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                pregnancy_unsafe = excluded.pregnancy_unsafe,
                breastfeeding_unsafe = excluded.breastfeeding_unsafe,
                major_side_effects = excluded.major_side_effects,
                updated_at = datetime('now')
            RETURNING id
            "#,
            params![
                molecule.name,
                molecule.pregnancy_unsafe,
                molecule.breastfeeding_unsafe,
                molecule.major_side_effects,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get a molecule ID by name, creating a bare molecule if missing.
    pub fn get_or_create_molecule(&self, name: &str) -> DbResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM molecules WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?;
        match existing {
            Some(id) => Ok(id),
            None => {
                self.conn
                    .execute("INSERT INTO molecules (name) VALUES (?)", [name])?;
                Ok(self.conn.last_insert_rowid())
            }
        }
    }

    /// Replace a molecule's associations of one kind with the named items,
    /// creating missing items.
    pub fn set_molecule_links(
        &self,
        molecule_id: i64,
        kind: ReferenceKind,
        names: &[String],
    ) -> DbResult<()> {
        self.conn.execute(
            r#"
            DELETE FROM molecule_links
            WHERE molecule_id = ?1
            AND item_id IN (SELECT id FROM reference_items WHERE kind = ?2)
            "#,
            params![molecule_id, kind.as_str()],
        )?;

        for name in names {
            let item_id = self.get_or_create_reference(kind, name)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO molecule_links (molecule_id, item_id) VALUES (?1, ?2)",
                params![molecule_id, item_id],
            )?;
        }
        Ok(())
    }

    /// Persist a molecule with every association and commercial name.
    pub fn save_molecule(&self, molecule: &Molecule) -> DbResult<i64> {
        self.atomically(|db| {
            let id = db.upsert_molecule(molecule)?;

            db.set_molecule_links(id, ReferenceKind::Allergy, &molecule.allergies)?;
            db.set_molecule_links(id, ReferenceKind::MedicalHistory, &molecule.medical_history)?;
            db.set_molecule_links(
                id,
                ReferenceKind::CurrentMedication,
                &molecule.current_medications,
            )?;
            db.set_molecule_links(id, ReferenceKind::Indication, &molecule.indications)?;
            db.set_molecule_links(id, ReferenceKind::Precaution, &molecule.precautions)?;
            db.set_molecule_links(id, ReferenceKind::MedicalClass, &molecule.medical_classes)?;

            for commercial in &molecule.commercial_names {
                let mut commercial = commercial.clone();
                commercial.molecule_id = id;
                db.upsert_commercial_name(&commercial)?;
            }

            Ok(id)
        })
    }

    /// Get a molecule with its associations.
    pub fn get_molecule(&self, id: i64) -> DbResult<Option<Molecule>> {
        let molecule = self
            .conn
            .query_row(
                r#"
                SELECT id, name, pregnancy_unsafe, breastfeeding_unsafe, major_side_effects
                FROM molecules
                WHERE id = ?
                "#,
                [id],
                map_molecule_row,
            )
            .optional()?;

        molecule.map(|m| self.hydrate_molecule(m)).transpose()
    }

    /// Get a molecule by exact name.
    pub fn get_molecule_by_name(&self, name: &str) -> DbResult<Option<Molecule>> {
        let molecule = self
            .conn
            .query_row(
                r#"
                SELECT id, name, pregnancy_unsafe, breastfeeding_unsafe, major_side_effects
                FROM molecules
                WHERE name = ?
                "#,
                [name],
                map_molecule_row,
            )
            .optional()?;

        molecule.map(|m| self.hydrate_molecule(m)).transpose()
    }

    /// All molecules belonging to any of the given medical classes, by ascending ID.
    pub fn molecules_in_classes(&self, medical_class_ids: &[i64]) -> DbResult<Vec<Molecule>> {
        if medical_class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids_json = serde_json::to_string(medical_class_ids)?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT m.id, m.name, m.pregnancy_unsafe, m.breastfeeding_unsafe,
                   m.major_side_effects
            FROM molecules m
            JOIN molecule_links ml ON ml.molecule_id = m.id
            WHERE ml.item_id IN (SELECT value FROM json_each(?1))
            ORDER BY m.id
            "#,
        )?;

        let rows = stmt.query_map([ids_json], map_molecule_row)?;

        let mut molecules = Vec::new();
        for row in rows {
            molecules.push(self.hydrate_molecule(row?)?);
        }
        Ok(molecules)
    }

    /// List all molecules, by name.
    pub fn list_molecules(&self) -> DbResult<Vec<MoleculeRef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM molecules ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(MoleculeRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Resolve molecule IDs to references, preserving the given order.
    pub fn molecule_refs(&self, ids: &[i64]) -> DbResult<Vec<MoleculeRef>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM molecules WHERE id = ?")?;

        let mut refs = Vec::with_capacity(ids.len());
        for id in ids {
            let found = stmt
                .query_row([id], |row| {
                    Ok(MoleculeRef {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })
                .optional()?;
            refs.push(found.ok_or_else(|| DbError::NotFound(format!("molecule {}", id)))?);
        }
        Ok(refs)
    }

    /// Delete a molecule. Links, brands and interactions cascade.
    pub fn delete_molecule(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM molecules WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Commercial names
    // =========================================================================

    /// Insert or update a commercial name, keyed by (molecule, name). Returns the ID.
    pub fn upsert_commercial_name(&self, commercial: &CommercialName) -> DbResult<i64> {
        let id = self.conn.query_row(
            r#"
            INSERT INTO commercial_names (molecule_id, name, dosage, form, packaging)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(molecule_id, name) DO UPDATE SET
                dosage = excluded.dosage,
                form = excluded.form,
                packaging = excluded.packaging
            RETURNING id
            "#,
            params![
                commercial.molecule_id,
                commercial.name,
                commercial.dosage,
                commercial.form,
                commercial.packaging,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get a commercial name by ID.
    pub fn get_commercial_name(&self, id: i64) -> DbResult<Option<CommercialName>> {
        self.conn
            .query_row(
                r#"
                SELECT id, molecule_id, name, dosage, form, packaging
                FROM commercial_names
                WHERE id = ?
                "#,
                [id],
                map_commercial_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Commercial names of a molecule, by ascending ID.
    pub fn list_commercial_names(&self, molecule_id: i64) -> DbResult<Vec<CommercialName>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT id, molecule_id, name, dosage, form, packaging
            FROM commercial_names
            WHERE molecule_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([molecule_id], map_commercial_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Load associations and commercial names onto a bare molecule row.
    fn hydrate_molecule(&self, mut molecule: Molecule) -> DbResult<Molecule> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT ri.kind, ri.name
            FROM molecule_links ml
            JOIN reference_items ri ON ri.id = ml.item_id
            WHERE ml.molecule_id = ?
            ORDER BY ri.id
            "#,
        )?;
        let rows = stmt.query_map([molecule.id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (kind, name) = row?;
            let kind = kind
                .parse::<ReferenceKind>()
                .map_err(|e| DbError::Constraint(e.to_string()))?;
            match kind {
                ReferenceKind::Allergy => molecule.allergies.push(name),
                ReferenceKind::MedicalHistory => molecule.medical_history.push(name),
                ReferenceKind::CurrentMedication => molecule.current_medications.push(name),
                ReferenceKind::Indication => molecule.indications.push(name),
                ReferenceKind::Precaution => molecule.precautions.push(name),
                ReferenceKind::MedicalClass => molecule.medical_classes.push(name),
            }
        }

        molecule.commercial_names = self.list_commercial_names(molecule.id)?;
        Ok(molecule)
    }
}

fn map_molecule_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Molecule> {
    let mut molecule = Molecule::new(row.get(0)?, row.get(1)?);
    molecule.pregnancy_unsafe = row.get(2)?;
    molecule.breastfeeding_unsafe = row.get(3)?;
    molecule.major_side_effects = row.get(4)?;
    Ok(molecule)
}

fn map_commercial_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommercialName> {
    Ok(CommercialName {
        id: row.get(0)?,
        molecule_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        form: row.get(4)?,
        packaging: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_paracetamol() -> Molecule {
        let mut molecule = Molecule::new(0, "Paracétamol".into());
        molecule.indications = vec!["fièvre".into(), "douleur".into()];
        molecule.precautions = vec!["insuffisance hépatique".into()];
        molecule.allergies = vec!["paracétamol".into()];
        molecule.medical_classes = vec!["Antalgiques".into()];
        molecule.major_side_effects = Some("hépatotoxicité".into());
        molecule.commercial_names = vec![CommercialName {
            dosage: Some("1000 mg".into()),
            ..CommercialName::new(0, "Doliprane".into())
        }];
        molecule
    }

    #[test]
    fn test_save_and_get() {
        let db = setup_db();
        let id = db.save_molecule(&make_paracetamol()).unwrap();

        let molecule = db.get_molecule(id).unwrap().unwrap();
        assert_eq!(molecule.name, "Paracétamol");
        assert_eq!(molecule.indications, vec!["fièvre", "douleur"]);
        assert_eq!(molecule.precautions, vec!["insuffisance hépatique"]);
        assert_eq!(molecule.allergies, vec!["paracétamol"]);
        assert_eq!(molecule.medical_classes, vec!["Antalgiques"]);
        assert_eq!(molecule.commercial_names.len(), 1);
        assert_eq!(molecule.commercial_names[0].molecule_id, id);
        assert_eq!(molecule.commercial_names[0].dosage.as_deref(), Some("1000 mg"));
    }

    #[test]
    fn test_upsert_keeps_id_and_updates_flags() {
        let db = setup_db();
        let mut molecule = make_paracetamol();
        let id1 = db.save_molecule(&molecule).unwrap();

        molecule.pregnancy_unsafe = true;
        let id2 = db.upsert_molecule(&molecule).unwrap();
        assert_eq!(id1, id2);

        let stored = db.get_molecule_by_name("Paracétamol").unwrap().unwrap();
        assert!(stored.pregnancy_unsafe);
        // Links untouched by a plain upsert
        assert_eq!(stored.indications.len(), 2);
    }

    #[test]
    fn test_set_links_replaces_one_kind_only() {
        let db = setup_db();
        let id = db.save_molecule(&make_paracetamol()).unwrap();

        db.set_molecule_links(id, ReferenceKind::Indication, &["céphalée".to_string()])
            .unwrap();

        let molecule = db.get_molecule(id).unwrap().unwrap();
        assert_eq!(molecule.indications, vec!["céphalée"]);
        assert_eq!(molecule.precautions, vec!["insuffisance hépatique"]);
    }

    #[test]
    fn test_molecules_in_classes() {
        let db = setup_db();
        let para = db.save_molecule(&make_paracetamol()).unwrap();

        let mut amox = Molecule::new(0, "Amoxicilline".into());
        amox.medical_classes = vec!["Antibiotiques".into()];
        let amox = db.save_molecule(&amox).unwrap();

        let mut ibu = Molecule::new(0, "Ibuprofène".into());
        ibu.medical_classes = vec!["Antalgiques".into(), "AINS".into()];
        let ibu = db.save_molecule(&ibu).unwrap();

        let antalgiques = db
            .find_reference(ReferenceKind::MedicalClass, "Antalgiques")
            .unwrap()
            .unwrap()
            .id;
        let ains = db
            .find_reference(ReferenceKind::MedicalClass, "AINS")
            .unwrap()
            .unwrap()
            .id;

        let pool = db.molecules_in_classes(&[antalgiques, ains]).unwrap();
        let ids: Vec<i64> = pool.iter().map(|m| m.id).collect();
        // Distinct, ascending ID
        assert_eq!(ids, vec![para, ibu]);
        assert!(!ids.contains(&amox));

        assert!(db.molecules_in_classes(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_molecule_refs_preserve_order() {
        let db = setup_db();
        let a = db.get_or_create_molecule("A").unwrap();
        let b = db.get_or_create_molecule("B").unwrap();

        let refs = db.molecule_refs(&[b, a]).unwrap();
        assert_eq!(refs[0].name, "B");
        assert_eq!(refs[1].name, "A");

        assert!(matches!(
            db.molecule_refs(&[a, 999]),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_commercial_names_ordered_by_id() {
        let db = setup_db();
        let id = db.get_or_create_molecule("Ibuprofène").unwrap();
        db.upsert_commercial_name(&CommercialName::new(id, "Nurofen".into()))
            .unwrap();
        db.upsert_commercial_name(&CommercialName::new(id, "Advil".into()))
            .unwrap();

        let names = db.list_commercial_names(id).unwrap();
        assert_eq!(names[0].name, "Nurofen");
        assert_eq!(names[1].name, "Advil");
    }

    #[test]
    fn test_delete_cascades_links() {
        let db = setup_db();
        let id = db.save_molecule(&make_paracetamol()).unwrap();
        assert!(db.delete_molecule(id).unwrap());
        assert!(db.get_molecule(id).unwrap().is_none());
        assert!(db.list_commercial_names(id).unwrap().is_empty());
    }
}

//! Reference-item registry operations.
//!
//! Every flat reference entity shares one table, discriminated by
//! [`ReferenceKind`]; the kind picks the rows, never a table name.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{ReferenceItem, ReferenceKind};

impl Database {
    /// Get the ID of the named item, creating it if missing.
    pub fn get_or_create_reference(&self, kind: ReferenceKind, name: &str) -> DbResult<i64> {
        if let Some(item) = self.find_reference(kind, name)? {
            return Ok(item.id);
        }

        self.conn.execute(
            "INSERT INTO reference_items (kind, name) VALUES (?1, ?2)",
            params![kind.as_str(), name],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(kind = %kind, name, id, "created reference item");
        Ok(id)
    }

    /// Find an item by exact name.
    pub fn find_reference(&self, kind: ReferenceKind, name: &str) -> DbResult<Option<ReferenceItem>> {
        self.conn
            .query_row(
                "SELECT id, kind, name, description FROM reference_items WHERE kind = ?1 AND name = ?2",
                params![kind.as_str(), name],
                map_reference_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get an item by ID.
    pub fn get_reference(&self, id: i64) -> DbResult<Option<ReferenceItem>> {
        self.conn
            .query_row(
                "SELECT id, kind, name, description FROM reference_items WHERE id = ?",
                [id],
                map_reference_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all items of a kind, ordered by name.
    pub fn list_reference(&self, kind: ReferenceKind) -> DbResult<Vec<ReferenceItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, name, description FROM reference_items WHERE kind = ? ORDER BY name",
        )?;
        let rows = stmt.query_map([kind.as_str()], map_reference_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Search items of a kind by name prefix.
    pub fn search_reference(
        &self,
        kind: ReferenceKind,
        prefix: &str,
        limit: usize,
    ) -> DbResult<Vec<ReferenceItem>> {
        let pattern = format!("{}%", escape_like(prefix));
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, kind, name, description
            FROM reference_items
            WHERE kind = ?1 AND name LIKE ?2 ESCAPE '\'
            ORDER BY name
            LIMIT ?3
            "#,
        )?;
        let rows = stmt.query_map(
            params![kind.as_str(), pattern, limit as i64],
            map_reference_row,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Set or clear an item's description.
    pub fn set_reference_description(&self, id: i64, description: Option<&str>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE reference_items SET description = ?2 WHERE id = ?1",
            params![id, description],
        )?;
        Ok(rows_affected > 0)
    }

    /// Resolve IDs to names, in ID order. Every ID must exist and be of `kind`.
    pub fn reference_names(&self, kind: ReferenceKind, ids: &[i64]) -> DbResult<Vec<String>> {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut names = Vec::with_capacity(sorted.len());
        for id in sorted {
            let item = self
                .get_reference(id)?
                .ok_or_else(|| DbError::NotFound(format!("{} {}", kind, id)))?;
            if item.kind != kind {
                return Err(DbError::Constraint(format!(
                    "reference {} is a {}, expected {}",
                    id, item.kind, kind
                )));
            }
            names.push(item.name);
        }
        Ok(names)
    }
}

/// Intermediate row struct for database mapping.
struct ReferenceRow {
    id: i64,
    kind: String,
    name: String,
    description: Option<String>,
}

fn map_reference_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceRow> {
    Ok(ReferenceRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
    })
}

impl TryFrom<ReferenceRow> for ReferenceItem {
    type Error = DbError;

    fn try_from(row: ReferenceRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<ReferenceKind>()
            .map_err(|e| DbError::Constraint(e.to_string()))?;
        Ok(ReferenceItem {
            id: row.id,
            kind,
            name: row.name,
            description: row.description,
        })
    }
}

/// Escape LIKE wildcards so a prefix matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

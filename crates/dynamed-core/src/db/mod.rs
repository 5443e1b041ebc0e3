//! Database layer for the DynaMed core.

mod schema;
mod reference;
mod molecules;
mod diagnoses;
mod interactions;
mod consultations;
mod prescriptions;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Surface constraint and trigger failures as [`DbError::Constraint`].
pub(crate) fn map_constraint(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(msg)
        }
        other => DbError::Sqlite(other),
    }
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        tracing::debug!("database schema initialized");
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` atomically. Opens a transaction at the top level and a
    /// savepoint when one is already open, so store methods compose.
    pub fn atomically<T, E>(&self, f: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction().map_err(DbError::from)?;
            let value = f(self)?;
            tx.commit().map_err(DbError::from)?;
            return Ok(value);
        }

        self.conn
            .execute_batch("SAVEPOINT dynamed_atomic")
            .map_err(DbError::from)?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("RELEASE dynamed_atomic")
                    .map_err(DbError::from)?;
                Ok(value)
            }
            Err(e) => {
                self.conn
                    .execute_batch("ROLLBACK TO dynamed_atomic; RELEASE dynamed_atomic")
                    .map_err(DbError::from)?;
                Err(e)
            }
        }
    }

    /// Current reference-data revision. Any write to molecules, their links,
    /// reference items or diagnosis classes increments it.
    pub fn reference_revision(&self) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT revision FROM reference_revision WHERE id = 1",
            [],
            |row| row.get(0),
        )?)
    }
}

//! SQLite connection bootstrap for the durable task store.
//!
//! Task records are never read or written on a connection whose schema
//! version does not match [`SCHEMA_VERSION`].

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{ensure_current, install_schema, schema_version, SCHEMA_VERSION};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to reach a usable task database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a different schema version.
    SchemaMismatch { found: u32, expected: u32 },
}

impl DbError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite_failed",
            Self::SchemaMismatch { .. } => "db_schema_mismatch",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaMismatch { found, expected } => {
                write!(f, "schema version {found}, expected {expected}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaMismatch { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

//! Durable task store contracts.
//!
//! # Responsibility
//! - Define the key-value persistence seam for full task records.
//! - Classify storage faults into unavailable/read/write categories.
//!
//! # Invariants
//! - Every operation is atomic and scoped to a single record or snapshot.
//! - `put` fully replaces the record at `task.id` (upsert).
//! - `delete` of an absent id is a no-op, not an error.

mod sqlite;

pub use sqlite::SqliteTaskStore;

use crate::db::DbError;
use crate::model::task::{Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage fault surfaced by a durable store.
#[derive(Debug)]
pub enum StoreError {
    /// Storage cannot be opened or is not initialized. Fatal for the session.
    Unavailable(DbError),
    /// Transient fault while reading records.
    Read(rusqlite::Error),
    /// Transient fault while writing records.
    Write(rusqlite::Error),
    /// A persisted record could not be decoded. Reported as a read fault.
    InvalidData(String),
}

impl StoreError {
    /// Stable error code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "storage_unavailable",
            Self::Read(_) | Self::InvalidData(_) => "storage_read_failed",
            Self::Write(_) => "storage_write_failed",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::Read(err) => write!(f, "storage read failed: {err}"),
            Self::Write(err) => write!(f, "storage write failed: {err}"),
            Self::InvalidData(message) => {
                write!(f, "storage read failed: invalid persisted task data: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value)
    }
}

/// Persistent mapping from task id to full task record.
pub trait TaskStore {
    /// Returns every stored record; order is unspecified.
    fn get_all(&self) -> StoreResult<Vec<Task>>;
    /// Returns one record by id.
    fn get(&self, id: TaskId) -> StoreResult<Option<Task>>;
    /// Inserts or fully replaces the record at `task.id`.
    fn put(&self, task: &Task) -> StoreResult<()>;
    /// Removes the record at `id`; absent ids are ignored.
    fn delete(&self, id: TaskId) -> StoreResult<()>;

    /// Highest id currently stored, used to keep new ids monotonic.
    fn max_id(&self) -> StoreResult<Option<TaskId>> {
        Ok(self.get_all()?.iter().map(|task| task.id).max())
    }
}

//! Typed task repository over a durable store.
//!
//! # Responsibility
//! - Provide create/update/list/remove use-cases with validation.
//! - Assign task identity and creation time.
//!
//! # Invariants
//! - Validation runs before any storage write is issued.
//! - Issued ids are strictly increasing within a repository instance and
//!   never collide with an id already present in storage.
//! - `created_at` of an existing record is never overwritten.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch, TaskValidationError};
use crate::store::{StoreError, TaskStore};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and validation.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Store(StoreError),
    NotFound(TaskId),
}

impl RepoError {
    /// Stable error code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Store(err) => err.code(),
            Self::NotFound(_) => "task_not_found",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Single source of truth for task data.
pub struct TaskRepository<S: TaskStore> {
    store: S,
    clock: Box<dyn Clock>,
    last_issued_id: Cell<Option<TaskId>>,
}

impl<S: TaskStore> TaskRepository<S> {
    /// Creates a repository using the process wall clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }

    /// Creates a repository with an injected time source.
    pub fn with_clock(store: S, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
            last_issued_id: Cell::new(None),
        }
    }

    /// Returns the underlying durable store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists every stored task in storage order.
    pub fn list_all(&self) -> RepoResult<Vec<Task>> {
        Ok(self.store.get_all()?)
    }

    /// Gets one task by id.
    pub fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        Ok(self.store.get(id)?)
    }

    /// Creates and persists a new task.
    ///
    /// # Contract
    /// - Rejects whitespace-only titles before touching storage.
    /// - Assigns `id` and `created_at`; `status` defaults to `todo`.
    /// - Returns the record exactly as persisted.
    pub fn create(&self, draft: TaskDraft) -> RepoResult<Task> {
        draft.validate()?;
        let created_at = self.clock.now();
        let id = self.next_id(created_at.timestamp_millis())?;
        let task = Task::from_draft(id, created_at, draft)?;

        self.store.put(&task)?;
        self.last_issued_id.set(Some(task.id));
        Ok(task)
    }

    /// Shallow-merges `patch` over the stored record and rewrites it.
    ///
    /// Returns `NotFound` when no record exists at `id`.
    pub fn update(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        let mut task = self.store.get(id)?.ok_or(RepoError::NotFound(id))?;
        task.apply(patch)?;
        self.store.put(&task)?;
        Ok(task)
    }

    /// Rewrites a full record produced outside the board, e.g. by sync.
    ///
    /// The stored `created_at` wins over the incoming value.
    pub fn replace(&self, task: &Task) -> RepoResult<Task> {
        task.validate()?;
        let existing = self
            .store
            .get(task.id)?
            .ok_or(RepoError::NotFound(task.id))?;

        let mut merged = task.clone();
        merged.created_at = existing.created_at;
        self.store.put(&merged)?;
        Ok(merged)
    }

    /// Removes a task. Removing an absent id succeeds.
    pub fn remove(&self, id: TaskId) -> RepoResult<()> {
        Ok(self.store.delete(id)?)
    }

    fn next_id(&self, now_ms: i64) -> RepoResult<TaskId> {
        let last = match self.last_issued_id.get() {
            Some(last) => Some(last),
            None => self.store.max_id()?,
        };
        Ok(match last {
            Some(last) if last >= now_ms => last + 1,
            _ => now_ms,
        })
    }
}

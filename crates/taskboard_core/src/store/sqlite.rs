//! SQLite-backed durable task store.
//!
//! # Responsibility
//! - Map task records to rows of the `tasks` table.
//! - Keep SQL and text encodings of dates inside the storage boundary.
//!
//! # Invariants
//! - Each public operation is a single SQL statement, hence atomic.
//! - Read paths reject undecodable rows instead of masking them.

use super::{StoreError, StoreResult, TaskStore};
use crate::db::ensure_current;
use crate::model::task::{Priority, Task, TaskId, TaskStatus};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    status,
    priority,
    assignee,
    due_date,
    created_at,
    synced_at
FROM tasks";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable store over a migrated SQLite connection.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// Fails with `StoreError::Unavailable` when the schema is missing or
    /// was written by a different version.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_current(conn)?;
        Ok(Self { conn })
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn get_all(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(TASK_SELECT_SQL).map_err(StoreError::Read)?;
        let mut rows = stmt.query([]).map_err(StoreError::Read)?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next().map_err(StoreError::Read)? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))
            .map_err(StoreError::Read)?;
        let mut rows = stmt.query([id]).map_err(StoreError::Read)?;
        match rows.next().map_err(StoreError::Read)? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn put(&self, task: &Task) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO tasks (
                    id,
                    title,
                    description,
                    status,
                    priority,
                    assignee,
                    due_date,
                    created_at,
                    synced_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    status = excluded.status,
                    priority = excluded.priority,
                    assignee = excluded.assignee,
                    due_date = excluded.due_date,
                    created_at = excluded.created_at,
                    synced_at = excluded.synced_at;",
                params![
                    task.id,
                    task.title.as_str(),
                    task.description.as_deref(),
                    task.status.as_str(),
                    task.priority.map(Priority::as_str),
                    task.assignee.as_deref(),
                    task.due_date.map(format_date),
                    format_timestamp(task.created_at),
                    task.synced_at.map(format_timestamp),
                ],
            )
            .map_err(StoreError::Write)?;
        Ok(())
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])
            .map_err(StoreError::Write)?;
        Ok(())
    }

    fn max_id(&self) -> StoreResult<Option<TaskId>> {
        self.conn
            .query_row("SELECT MAX(id) FROM tasks;", [], |row| {
                row.get::<_, Option<TaskId>>(0)
            })
            .map_err(StoreError::Read)
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id: TaskId = row.get("id").map_err(StoreError::Read)?;

    let status_text: String = row.get("status").map_err(StoreError::Read)?;
    let status = status_text.parse::<TaskStatus>().map_err(|err| {
        StoreError::InvalidData(format!("task {id}: {err} in tasks.status"))
    })?;

    let priority = match row
        .get::<_, Option<String>>("priority")
        .map_err(StoreError::Read)?
    {
        Some(value) => Some(value.parse::<Priority>().map_err(|err| {
            StoreError::InvalidData(format!("task {id}: {err} in tasks.priority"))
        })?),
        None => None,
    };

    let due_date = match row
        .get::<_, Option<String>>("due_date")
        .map_err(StoreError::Read)?
    {
        Some(value) => Some(parse_date(id, &value)?),
        None => None,
    };

    let created_text: String = row.get("created_at").map_err(StoreError::Read)?;
    let created_at = parse_timestamp(id, "created_at", &created_text)?;

    let synced_at = match row
        .get::<_, Option<String>>("synced_at")
        .map_err(StoreError::Read)?
    {
        Some(value) => Some(parse_timestamp(id, "synced_at", &value)?),
        None => None,
    };

    Ok(Task {
        id,
        title: row.get("title").map_err(StoreError::Read)?,
        description: row.get("description").map_err(StoreError::Read)?,
        status,
        priority,
        assignee: row.get("assignee").map_err(StoreError::Read)?,
        due_date,
        created_at,
        synced_at,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(id: TaskId, value: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!(
            "task {id}: invalid date `{value}` in tasks.due_date"
        ))
    })
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(id: TaskId, column: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            StoreError::InvalidData(format!(
                "task {id}: invalid timestamp `{value}` in tasks.{column}"
            ))
        })
}

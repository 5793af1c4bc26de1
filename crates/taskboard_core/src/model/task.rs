//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its status lanes and priority levels.
//! - Provide create/update input shapes with shallow-merge semantics.
//! - Enforce title rules at the create/edit boundary.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `status` is always one of the three board lanes.
//! - `synced_at` is written only by the connectivity reconciler.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable task identifier derived from creation time in epoch milliseconds.
pub type TaskId = i64;

/// Board lane a task belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

impl TaskStatus {
    /// All lanes in board order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::Done => "done",
        }
    }

    /// Column header shown by the board.
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Lanes a task in this lane can be moved to, in board order.
    pub fn move_targets(self) -> Vec<TaskStatus> {
        Self::ALL
            .into_iter()
            .filter(|status| *status != self)
            .collect()
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(ParseEnumError::new("status", other)),
        }
    }
}

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

/// Unknown enum literal found while parsing a status or priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

impl Display for ParseEnumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} `{}`", self.field, self.value)
    }
}

impl Error for ParseEnumError {}

/// Field-level validation failure for caller-supplied task data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
}

impl TaskValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
        }
    }
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a new record from validated draft input.
    ///
    /// # Invariants
    /// - `status` falls back to `Todo` when the draft leaves it unset.
    /// - `synced_at` always starts empty.
    pub fn from_draft(
        id: TaskId,
        created_at: DateTime<Utc>,
        draft: TaskDraft,
    ) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id,
            title: normalize_title(&draft.title)?,
            description: normalize_text(draft.description),
            status: draft.status.unwrap_or_default(),
            priority: draft.priority,
            assignee: normalize_text(draft.assignee),
            due_date: draft.due_date,
            created_at,
            synced_at: None,
        })
    }

    /// Shallow-merges `patch` over this record.
    ///
    /// Provided fields overwrite, omitted fields are retained. The record is
    /// left untouched when the patch fails validation.
    pub fn apply(&mut self, patch: TaskPatch) -> Result<(), TaskValidationError> {
        let title = match patch.title {
            Some(title) => Some(normalize_title(&title)?),
            None => None,
        };

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = normalize_text(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee) = patch.assignee {
            self.assignee = normalize_text(assignee);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        Ok(())
    }

    /// Checks the edit-boundary rules on an already assembled record.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        normalize_title(&self.title).map(|_| ())
    }

    /// Due date has passed and the task is not finished.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && self.status != TaskStatus::Done,
            None => false,
        }
    }

    /// Relative due-date label for card display.
    pub fn due_label(&self, today: NaiveDate) -> Option<String> {
        let days = (self.due_date? - today).num_days();
        let label = match days {
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            -1 => "Yesterday".to_string(),
            d if d < -1 => format!("{} days ago", d.abs()),
            d => format!("{d} days left"),
        };
        Some(label)
    }
}

/// Input for creating a task. Identity and timestamps are assigned by storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Checks the creation rules without building a record.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        normalize_title(&self.title).map(|_| ())
    }
}

/// Partial update. Outer `None` means "keep", `Some(None)` means "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Option<Priority>>,
    pub assignee: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    /// Patch that only changes the lane.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that only changes the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Trims a title and rejects empty results.
pub fn normalize_title(raw: &str) -> Result<String, TaskValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskDraft, TaskPatch, TaskStatus, TaskValidationError};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample_task() -> Task {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Task::from_draft(1, created_at, TaskDraft::new("A")).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_draft_defaults_status_and_trims_text() {
        let mut draft = TaskDraft::new("  Write docs  ");
        draft.description = Some("   ".to_string());
        draft.assignee = Some(" sam ".to_string());
        let task = Task::from_draft(7, Utc::now(), draft).unwrap();

        assert_eq!(task.title, "Write docs");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.description, None);
        assert_eq!(task.assignee.as_deref(), Some("sam"));
        assert!(task.synced_at.is_none());
    }

    #[test]
    fn from_draft_rejects_whitespace_title() {
        let err = Task::from_draft(1, Utc::now(), TaskDraft::new("   ")).unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyTitle);
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn draft_validate_checks_title_only() {
        assert_eq!(
            TaskDraft::new(" \t ").validate(),
            Err(TaskValidationError::EmptyTitle)
        );
        assert!(TaskDraft::new("ok").validate().is_ok());
    }

    #[test]
    fn apply_keeps_omitted_fields() {
        let mut task = sample_task();
        task.priority = Some(Priority::High);

        task.apply(TaskPatch::status(TaskStatus::Done)).unwrap();

        assert_eq!(task.title, "A");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, Some(Priority::High));
    }

    #[test]
    fn apply_can_clear_optional_fields() {
        let mut task = sample_task();
        task.priority = Some(Priority::Low);
        task.due_date = Some(day(2024, 6, 1));

        task.apply(TaskPatch {
            priority: Some(None),
            due_date: Some(None),
            ..TaskPatch::default()
        })
        .unwrap();

        assert_eq!(task.priority, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn apply_with_blank_title_leaves_record_untouched() {
        let mut task = sample_task();
        let before = task.clone();

        let err = task
            .apply(TaskPatch {
                title: Some(" ".to_string()),
                status: Some(TaskStatus::Done),
                ..TaskPatch::default()
            })
            .unwrap_err();

        assert_eq!(err, TaskValidationError::EmptyTitle);
        assert_eq!(task, before);
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("in_progress".parse::<TaskStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"inprogress\""
        );
    }

    #[test]
    fn move_targets_exclude_current_lane() {
        assert_eq!(
            TaskStatus::InProgress.move_targets(),
            vec![TaskStatus::Todo, TaskStatus::Done]
        );
        assert_eq!(TaskStatus::Todo.label(), "To Do");
    }

    #[test]
    fn overdue_ignores_done_tasks() {
        let mut task = sample_task();
        task.due_date = Some(day(2024, 5, 10));

        assert!(task.is_overdue(day(2024, 5, 11)));
        assert!(!task.is_overdue(day(2024, 5, 10)));

        task.status = TaskStatus::Done;
        assert!(!task.is_overdue(day(2024, 5, 11)));
    }

    #[test]
    fn due_label_matches_card_wording() {
        let mut task = sample_task();
        assert_eq!(task.due_label(day(2024, 5, 10)), None);

        task.due_date = Some(day(2024, 5, 10));
        let label = |today| task.due_label(today).unwrap();
        assert_eq!(label(day(2024, 5, 10)), "Today");
        assert_eq!(label(day(2024, 5, 9)), "Tomorrow");
        assert_eq!(label(day(2024, 5, 11)), "Yesterday");
        assert_eq!(label(day(2024, 5, 13)), "3 days ago");
        assert_eq!(label(day(2024, 5, 5)), "5 days left");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut task = sample_task();
        task.due_date = Some(day(2024, 6, 1));
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["status"], "todo");
        assert_eq!(json["dueDate"], "2024-06-01");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("syncedAt").is_none());
    }
}

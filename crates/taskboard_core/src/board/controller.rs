//! Board state controller.
//!
//! # Responsibility
//! - Own the in-memory task sequence and selection shown by the view layer.
//! - Route create/update/delete/move intents through the repository.
//! - Notify subscribers about state changes and failures.
//!
//! # Invariants
//! - In-memory state changes only after the repository call succeeded.
//! - `reselect()` runs after every state change; a selected id that no longer
//!   exists is cleared.
//! - Tasks are ordered by `created_at`, then `id`.

use super::events::{BoardEvent, SubscriptionId, Subscribers};
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use crate::store::TaskStore;
use log::{error, info, warn};
use std::time::Instant;

/// In-memory board view backed by a task repository.
pub struct BoardController<S: TaskStore> {
    repo: TaskRepository<S>,
    tasks: Vec<Task>,
    selected: Option<TaskId>,
    active_status: TaskStatus,
    subscribers: Subscribers,
}

impl<S: TaskStore> BoardController<S> {
    /// Loads every stored task into memory.
    ///
    /// # Errors
    /// - Returns storage errors unchanged; a board that cannot load is not
    ///   usable for the session.
    pub fn load(repo: TaskRepository<S>) -> RepoResult<Self> {
        let started_at = Instant::now();
        let tasks = match repo.list_all() {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(
                    "event=board_load module=board status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                return Err(err);
            }
        };

        let mut board = Self {
            repo,
            tasks,
            selected: None,
            active_status: TaskStatus::Todo,
            subscribers: Subscribers::default(),
        };
        board.sort_tasks();
        info!(
            "event=board_load module=board status=ok duration_ms={} task_count={}",
            started_at.elapsed().as_millis(),
            board.tasks.len()
        );
        Ok(board)
    }

    /// Re-reads every task from the repository.
    ///
    /// State is left untouched when the read fails.
    pub fn reload(&mut self) -> RepoResult<()> {
        match self.repo.list_all() {
            Ok(tasks) => {
                self.replace_tasks(tasks);
                Ok(())
            }
            Err(err) => Err(self.report_failure("board_reload", "Failed to load tasks", None, err)),
        }
    }

    /// Current task sequence in board order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Task shown in the detail view, if any.
    pub fn selected(&self) -> Option<&Task> {
        self.selected.and_then(|id| self.task(id))
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.selected
    }

    /// Lane currently focused on narrow layouts.
    pub fn active_status(&self) -> TaskStatus {
        self.active_status
    }

    /// Tasks of one lane in board order.
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.status == status)
            .collect()
    }

    /// Task count per lane, in board order.
    pub fn column_counts(&self) -> [(TaskStatus, usize); 3] {
        TaskStatus::ALL.map(|status| {
            let count = self.tasks.iter().filter(|task| task.status == status).count();
            (status, count)
        })
    }

    pub fn repository(&self) -> &TaskRepository<S> {
        &self.repo
    }

    /// Registers a listener for board events.
    pub fn subscribe(&mut self, listener: impl FnMut(&BoardEvent) + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(listener))
    }

    /// Removes a listener. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Opens the detail view for a task on the board.
    pub fn select(&mut self, id: TaskId) -> RepoResult<()> {
        if self.task(id).is_none() {
            return Err(RepoError::NotFound(id));
        }
        if self.selected != Some(id) {
            self.selected = Some(id);
            self.notify(BoardEvent::SelectionChanged(Some(id)));
        }
        Ok(())
    }

    /// Closes the detail view.
    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.notify(BoardEvent::SelectionChanged(None));
        }
    }

    /// Focuses a lane; switching lanes closes the detail view.
    pub fn set_active_status(&mut self, status: TaskStatus) {
        self.active_status = status;
        self.clear_selection();
    }

    /// Creates a task; it appears on the board only after it is persisted.
    pub fn create_task(&mut self, draft: TaskDraft) -> RepoResult<Task> {
        let started_at = Instant::now();
        match self.repo.create(draft) {
            Ok(task) => {
                info!(
                    "event=task_create module=board status=ok task_id={} duration_ms={}",
                    task.id,
                    started_at.elapsed().as_millis()
                );
                self.tasks.push(task.clone());
                self.sort_tasks();
                self.notify(BoardEvent::TasksChanged);
                self.notify(BoardEvent::CreateFormClosed);
                self.reselect();
                Ok(task)
            }
            Err(err) => Err(self.report_failure("task_create", "Failed to add task", None, err)),
        }
    }

    /// Merges `patch` into a task and refreshes the selection if it is shown.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        let started_at = Instant::now();
        match self.repo.update(id, patch) {
            Ok(task) => {
                info!(
                    "event=task_update module=board status=ok task_id={} duration_ms={}",
                    id,
                    started_at.elapsed().as_millis()
                );
                self.commit_task(task.clone());
                Ok(task)
            }
            Err(err) => Err(self.report_failure(
                "task_update",
                "Failed to update task",
                Some(id),
                err,
            )),
        }
    }

    /// Deletes a task. Deleting an id that is already gone succeeds.
    pub fn delete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let started_at = Instant::now();
        match self.repo.remove(id) {
            Ok(()) => {
                let before = self.tasks.len();
                self.tasks.retain(|task| task.id != id);
                let removed = self.tasks.len() != before;
                info!(
                    "event=task_delete module=board status=ok task_id={} removed={} duration_ms={}",
                    id,
                    removed,
                    started_at.elapsed().as_millis()
                );
                if removed {
                    self.notify(BoardEvent::TasksChanged);
                }
                self.reselect();
                Ok(())
            }
            Err(err) => Err(self.report_failure(
                "task_delete",
                "Failed to delete task",
                Some(id),
                err,
            )),
        }
    }

    /// Moves a task to another lane.
    ///
    /// On success the detail view closes, whichever task it showed, and the
    /// active lane follows the moved task.
    pub fn move_task(&mut self, id: TaskId, status: TaskStatus) -> RepoResult<Task> {
        let started_at = Instant::now();
        match self.repo.update(id, TaskPatch::status(status)) {
            Ok(task) => {
                info!(
                    "event=task_move module=board status=ok task_id={} to={} duration_ms={}",
                    id,
                    status,
                    started_at.elapsed().as_millis()
                );
                self.active_status = status;
                self.clear_selection();
                self.commit_task(task.clone());
                Ok(task)
            }
            Err(err) => Err(self.report_failure("task_move", "Failed to move task", Some(id), err)),
        }
    }

    /// Re-resolves the selected id against current tasks.
    ///
    /// Returns `true` when the selection was cleared.
    pub fn reselect(&mut self) -> bool {
        match self.selected {
            Some(id) if self.task(id).is_none() => {
                self.selected = None;
                self.notify(BoardEvent::SelectionChanged(None));
                true
            }
            _ => false,
        }
    }

    /// Replaces the whole in-memory sequence, e.g. after reconciliation.
    pub(crate) fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.sort_tasks();
        self.notify(BoardEvent::TasksChanged);
        if !self.reselect() {
            if let Some(id) = self.selected {
                self.notify(BoardEvent::SelectionChanged(Some(id)));
            }
        }
    }

    pub(crate) fn notify(&mut self, event: BoardEvent) {
        self.subscribers.emit(&event);
    }

    fn commit_task(&mut self, task: Task) {
        let id = task.id;
        match self.tasks.iter_mut().find(|existing| existing.id == id) {
            Some(slot) => *slot = task,
            None => {
                self.tasks.push(task);
                self.sort_tasks();
            }
        }
        self.notify(BoardEvent::TasksChanged);
        if !self.reselect() && self.selected == Some(id) {
            self.notify(BoardEvent::SelectionChanged(Some(id)));
        }
    }

    fn sort_tasks(&mut self) {
        self.tasks
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    }

    fn report_failure(
        &mut self,
        event: &str,
        action: &str,
        id: Option<TaskId>,
        err: RepoError,
    ) -> RepoError {
        let task_id = id.map_or_else(|| "none".to_string(), |id| id.to_string());
        match err {
            RepoError::Store(_) => error!(
                "event={} module=board status=error task_id={} error_code={} error={}",
                event,
                task_id,
                err.code(),
                err
            ),
            _ => warn!(
                "event={} module=board status=error task_id={} error_code={}",
                event,
                task_id,
                err.code()
            ),
        }
        self.notify(BoardEvent::Error(format!("{action}: {err}")));
        err
    }
}

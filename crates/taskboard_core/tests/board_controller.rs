use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    BoardController, BoardEvent, FixedClock, RepoError, SqliteTaskStore, StoreError, StoreResult,
    Task, TaskDraft, TaskId, TaskPatch, TaskRepository, TaskStatus, TaskStore,
};

struct FaultyStore<'conn> {
    inner: SqliteTaskStore<'conn>,
    fail_writes: Cell<bool>,
}

impl TaskStore for FaultyStore<'_> {
    fn get_all(&self) -> StoreResult<Vec<Task>> {
        self.inner.get_all()
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.inner.get(id)
    }

    fn put(&self, task: &Task) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::Write(rusqlite::Error::InvalidQuery));
        }
        self.inner.put(task)
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::Write(rusqlite::Error::InvalidQuery));
        }
        self.inner.delete(id)
    }
}

/// Board whose clock issues ids 5, 6, 7, ...
fn board(conn: &Connection) -> BoardController<FaultyStore<'_>> {
    let store = FaultyStore {
        inner: SqliteTaskStore::try_new(conn).unwrap(),
        fail_writes: Cell::new(false),
    };
    let clock = FixedClock(Utc.timestamp_millis_opt(5).unwrap());
    BoardController::load(TaskRepository::with_clock(store, clock)).unwrap()
}

fn record_events<S: TaskStore>(board: &mut BoardController<S>) -> Rc<RefCell<Vec<BoardEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    board.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

fn fail_writes(board: &BoardController<FaultyStore<'_>>, fail: bool) {
    board.repository().store().fail_writes.set(fail);
}

#[test]
fn load_orders_tasks_by_creation_time() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    for (id, title) in [(30, "third"), (10, "first"), (20, "second")] {
        let created_at = Utc.timestamp_millis_opt(id).unwrap();
        store
            .put(&Task::from_draft(id, created_at, TaskDraft::new(title)).unwrap())
            .unwrap();
    }

    let board = BoardController::load(TaskRepository::new(store)).unwrap();

    let titles: Vec<&str> = board.tasks().iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, ["first", "second", "third"]);
    assert!(board.selected().is_none());
    assert_eq!(board.active_status(), TaskStatus::Todo);
}

#[test]
fn create_appends_and_closes_form() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let events = record_events(&mut board);

    let created = board.create_task(TaskDraft::new("Write tests")).unwrap();

    assert_eq!(board.tasks(), [created.clone()]);
    assert_eq!(
        *events.borrow(),
        [BoardEvent::TasksChanged, BoardEvent::CreateFormClosed]
    );
    assert_eq!(
        board.repository().get(created.id).unwrap(),
        Some(created)
    );
}

#[test]
fn failed_create_leaves_sequence_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    board.create_task(TaskDraft::new("existing")).unwrap();
    let events = record_events(&mut board);

    fail_writes(&board, true);
    let err = board.create_task(TaskDraft::new("doomed")).unwrap_err();

    assert!(matches!(err, RepoError::Store(StoreError::Write(_))));
    assert_eq!(board.tasks().len(), 1);
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], BoardEvent::Error(message) if message.starts_with("Failed to add task")));
}

#[test]
fn blank_title_is_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let events = record_events(&mut board);

    let err = board.create_task(TaskDraft::new("  \t ")).unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
    assert!(board.tasks().is_empty());
    assert!(board.repository().list_all().unwrap().is_empty());
    assert!(matches!(&events.borrow()[0], BoardEvent::Error(message) if message.contains("title")));
}

#[test]
fn update_refreshes_selected_task() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("draft")).unwrap();
    board.select(task.id).unwrap();
    let events = record_events(&mut board);

    board.update_task(task.id, TaskPatch::title("final")).unwrap();

    assert_eq!(board.selected().unwrap().title, "final");
    assert_eq!(board.task(task.id).unwrap().title, "final");
    assert_eq!(
        *events.borrow(),
        [
            BoardEvent::TasksChanged,
            BoardEvent::SelectionChanged(Some(task.id))
        ]
    );
}

#[test]
fn failed_update_leaves_state_untouched() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("stable")).unwrap();
    board.select(task.id).unwrap();

    fail_writes(&board, true);
    let err = board
        .update_task(task.id, TaskPatch::status(TaskStatus::Done))
        .unwrap_err();

    assert_eq!(err.code(), "storage_write_failed");
    assert_eq!(board.tasks(), [task.clone()]);
    assert_eq!(board.selected_id(), Some(task.id));
}

#[test]
fn update_of_unknown_task_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let events = record_events(&mut board);

    let err = board.update_task(404, TaskPatch::title("nope")).unwrap_err();

    assert!(matches!(err, RepoError::NotFound(404)));
    assert!(matches!(&events.borrow()[0], BoardEvent::Error(_)));
}

#[test]
fn deleting_selected_task_clears_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("five")).unwrap();
    assert_eq!(task.id, 5);
    board.select(5).unwrap();

    board.delete_task(5).unwrap();

    assert!(board.selected().is_none());
    assert!(board.tasks().is_empty());
    assert!(board.repository().get(5).unwrap().is_none());
}

#[test]
fn deleting_other_task_keeps_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let kept = board.create_task(TaskDraft::new("kept")).unwrap();
    let dropped = board.create_task(TaskDraft::new("dropped")).unwrap();
    board.select(kept.id).unwrap();

    board.delete_task(dropped.id).unwrap();
    board.delete_task(dropped.id).unwrap();

    assert_eq!(board.selected_id(), Some(kept.id));
    assert_eq!(board.tasks().len(), 1);
}

#[test]
fn failed_delete_keeps_task_and_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("sticky")).unwrap();
    board.select(task.id).unwrap();

    fail_writes(&board, true);
    assert!(board.delete_task(task.id).is_err());

    assert_eq!(board.tasks().len(), 1);
    assert_eq!(board.selected_id(), Some(task.id));
}

#[test]
fn move_closes_selection_and_sets_status() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    for title in ["five", "six", "seven"] {
        board.create_task(TaskDraft::new(title)).unwrap();
    }
    board.select(7).unwrap();

    let moved = board.move_task(7, TaskStatus::Done).unwrap();

    assert_eq!(moved.status, TaskStatus::Done);
    assert!(board.selected().is_none());
    assert_eq!(board.task(7).unwrap().status, TaskStatus::Done);
    assert_eq!(board.active_status(), TaskStatus::Done);
    assert_eq!(
        board.repository().get(7).unwrap().unwrap().status,
        TaskStatus::Done
    );
}

#[test]
fn moving_another_task_also_closes_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let open = board.create_task(TaskDraft::new("open")).unwrap();
    let other = board.create_task(TaskDraft::new("other")).unwrap();
    board.select(open.id).unwrap();

    board.move_task(other.id, TaskStatus::InProgress).unwrap();

    assert!(board.selected().is_none());
}

#[test]
fn failed_move_keeps_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("stay")).unwrap();
    board.select(task.id).unwrap();

    fail_writes(&board, true);
    assert!(board.move_task(task.id, TaskStatus::Done).is_err());

    assert_eq!(board.selected_id(), Some(task.id));
    assert_eq!(board.task(task.id).unwrap().status, TaskStatus::Todo);
    assert_eq!(board.active_status(), TaskStatus::Todo);
}

#[test]
fn select_unknown_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);

    assert!(matches!(board.select(9), Err(RepoError::NotFound(9))));
    assert!(board.selected().is_none());
}

#[test]
fn switching_lane_closes_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("lane")).unwrap();
    board.select(task.id).unwrap();

    board.set_active_status(TaskStatus::InProgress);

    assert_eq!(board.active_status(), TaskStatus::InProgress);
    assert!(board.selected().is_none());
}

#[test]
fn columns_group_tasks_by_status() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let a = board.create_task(TaskDraft::new("a")).unwrap();
    let b = board.create_task(TaskDraft::new("b")).unwrap();
    board.create_task(TaskDraft::new("c")).unwrap();
    board.move_task(a.id, TaskStatus::Done).unwrap();
    board.move_task(b.id, TaskStatus::Done).unwrap();

    let done: Vec<TaskId> = board
        .column(TaskStatus::Done)
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(done, [a.id, b.id]);
    assert_eq!(
        board.column_counts(),
        [
            (TaskStatus::Todo, 1),
            (TaskStatus::InProgress, 0),
            (TaskStatus::Done, 2)
        ]
    );
}

#[test]
fn reload_drops_selection_of_externally_deleted_task() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let task = board.create_task(TaskDraft::new("external")).unwrap();
    board.select(task.id).unwrap();
    let events = record_events(&mut board);

    conn.execute("DELETE FROM tasks WHERE id = ?1;", [task.id])
        .unwrap();
    board.reload().unwrap();

    assert!(board.tasks().is_empty());
    assert!(board.selected().is_none());
    assert_eq!(
        *events.borrow(),
        [BoardEvent::TasksChanged, BoardEvent::SelectionChanged(None)]
    );
}

#[test]
fn unsubscribed_listener_stops_receiving_events() {
    let conn = open_db_in_memory().unwrap();
    let mut board = board(&conn);
    let count = Rc::new(Cell::new(0));
    let sink = Rc::clone(&count);
    let id = board.subscribe(move |_| sink.set(sink.get() + 1));

    board.create_task(TaskDraft::new("one")).unwrap();
    assert_eq!(count.get(), 2);

    assert!(board.unsubscribe(id));
    assert!(!board.unsubscribe(id));
    board.create_task(TaskDraft::new("two")).unwrap();
    assert_eq!(count.get(), 2);
}
